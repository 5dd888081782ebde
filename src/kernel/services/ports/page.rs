//! Page surface: typed anchors looked up by element id.

use std::rc::Rc;

use super::editor::EditorHost;
use super::terminal::TerminalView;
use crate::kernel::explorer::ExplorerRow;

pub trait ExplorerView {
    /// Replace whatever is shown with `rows`.
    fn render(&self, rows: &[ExplorerRow]);
}

pub trait PreviewFrame {
    fn navigate(&self, url: &str);
}

#[derive(Clone)]
pub enum Anchor {
    EditorContainer(Rc<dyn EditorHost>),
    Terminal(Rc<dyn TerminalView>),
    Explorer(Rc<dyn ExplorerView>),
    Frame(Rc<dyn PreviewFrame>),
    /// A clickable trigger; clicks are posted on the bus by the host.
    Trigger,
    /// Any element the session has no typed use for.
    Element,
}

impl Anchor {
    pub fn kind(&self) -> &'static str {
        match self {
            Anchor::EditorContainer(_) => "editor container",
            Anchor::Terminal(_) => "terminal",
            Anchor::Explorer(_) => "file explorer",
            Anchor::Frame(_) => "frame",
            Anchor::Trigger => "trigger",
            Anchor::Element => "element",
        }
    }
}

impl std::fmt::Debug for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Anchor").field(&self.kind()).finish()
    }
}

pub trait Page {
    fn anchor(&self, id: &str) -> Option<Anchor>;
}
