use perch_core::{Creator, NativeType, Prop};

/// A button with a title.
pub fn button(title: impl Into<String>) -> Creator {
    let title = title.into();
    Creator::native(NativeType::Button)
        .on_not_rendered(move |widget| widget.set_prop("title", Prop::Text(title)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::Widget;

    #[test]
    fn test_title() {
        let widget = button("OK").release_ui_view();
        Widget::new(NativeType::View).add_subview(&widget).unwrap();
        assert_eq!(widget.native_type(), NativeType::Button);
        assert_eq!(widget.prop("title"), Some(Prop::Text("OK".to_string())));
    }
}
