use std::rc::Rc;

use crate::kernel::language::LanguageTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    pub value: String,
    pub language: LanguageTag,
    pub theme: String,
}

/// Identifies the buffer model currently bound to an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub u64);

/// Container anchor that can create an editor inside itself.
pub trait EditorHost {
    fn create(&self, options: EditorOptions) -> Rc<dyn TextEditor>;
}

/// Single-buffer text editor. Change notifications reach the session as
/// `SessionEvent::EditorChanged`.
pub trait TextEditor {
    fn value(&self) -> String;

    fn set_value(&self, text: &str);

    /// `None` when no buffer is bound.
    fn model(&self) -> Option<ModelId>;

    fn set_model_language(&self, model: ModelId, language: LanguageTag);

    fn language(&self) -> LanguageTag;
}
