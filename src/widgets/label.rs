use perch_core::{Creator, NativeType, Relay};

/// A label showing fixed text.
pub fn label(text: impl Into<String>) -> Creator {
    let text = text.into();
    Creator::native(NativeType::Label).on_not_rendered(move |widget| widget.set_text(text))
}

/// A label showing whatever the relay holds.
pub fn bound_label(text: Relay<String>) -> Creator {
    Creator::native(NativeType::Label).bind(text, |widget, text| widget.set_text(text))
}
