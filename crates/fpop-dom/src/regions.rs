#![forbid(unsafe_code)]

//! Named regions of the popup skeleton.
//!
//! Every element the engine addresses has a [`Region`] name, a stable class
//! (`fpop-<suffix>`) and, for most, a `customClass` key. [`PopupRegions`]
//! is the id map a [`DomBuilder`](crate::DomBuilder) hands back after
//! building the skeleton.

use crate::document::NodeId;

/// Prefix for every class the engine owns.
pub const CLASS_PREFIX: &str = "fpop-";

/// Icon types, one `div.fpop-icon.fpop-<type>` each in the skeleton.
pub const ICON_TYPES: [&str; 5] = ["success", "error", "warning", "info", "question"];

/// Build an engine-owned class name: `class_name("shown") == "fpop-shown"`.
pub fn class_name(suffix: &str) -> String {
    format!("{CLASS_PREFIX}{suffix}")
}

/// A named element of the popup skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Container,
    Popup,
    Header,
    CloseButton,
    Icon,
    Image,
    Title,
    Content,
    HtmlContainer,
    InputLabel,
    InputHost,
    ValidationMessage,
    Actions,
    Loader,
    ConfirmButton,
    CancelButton,
    Footer,
    TimerProgressBar,
}

impl Region {
    /// All regions, in skeleton (document) order.
    pub const ALL: [Region; 18] = [
        Region::Container,
        Region::Popup,
        Region::Header,
        Region::CloseButton,
        Region::Icon,
        Region::Image,
        Region::Title,
        Region::Content,
        Region::HtmlContainer,
        Region::InputLabel,
        Region::InputHost,
        Region::ValidationMessage,
        Region::Actions,
        Region::Loader,
        Region::ConfirmButton,
        Region::CancelButton,
        Region::Footer,
        Region::TimerProgressBar,
    ];

    /// Class suffix without the prefix.
    pub const fn suffix(self) -> &'static str {
        match self {
            Region::Container => "container",
            Region::Popup => "popup",
            Region::Header => "header",
            Region::CloseButton => "close",
            Region::Icon => "icon",
            Region::Image => "image",
            Region::Title => "title",
            Region::Content => "content",
            Region::HtmlContainer => "html-container",
            Region::InputLabel => "input-label",
            Region::InputHost => "input",
            Region::ValidationMessage => "validation-message",
            Region::Actions => "actions",
            Region::Loader => "loader",
            Region::ConfirmButton => "confirm",
            Region::CancelButton => "cancel",
            Region::Footer => "footer",
            Region::TimerProgressBar => "timer-progress-bar",
        }
    }

    /// The engine-owned class of this region.
    pub fn class(self) -> String {
        class_name(self.suffix())
    }

    /// The `customClass` mapping key that targets this region, if any.
    pub const fn custom_class_key(self) -> Option<&'static str> {
        Some(match self {
            Region::Container => "container",
            Region::Popup => "popup",
            Region::Header => "header",
            Region::CloseButton => "closeButton",
            Region::Icon => "icon",
            Region::Image => "image",
            Region::Title => "title",
            Region::Content => "content",
            Region::InputHost => "input",
            Region::ValidationMessage => "validationMessage",
            Region::Actions => "actions",
            Region::ConfirmButton => "confirmButton",
            Region::CancelButton => "cancelButton",
            Region::Footer => "footer",
            Region::HtmlContainer
            | Region::InputLabel
            | Region::Loader
            | Region::TimerProgressBar => return None,
        })
    }

    /// Reverse of [`custom_class_key`](Self::custom_class_key).
    pub fn from_custom_class_key(key: &str) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|r| r.custom_class_key() == Some(key))
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Node ids of every region of one mounted popup.
///
/// [`Region::Icon`] names the active icon: one of [`icons`](Self::icons),
/// switched with [`select_icon`](Self::select_icon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupRegions {
    ids: [NodeId; Region::ALL.len()],
    icons: [NodeId; ICON_TYPES.len()],
}

impl PopupRegions {
    /// Assemble from a per-region lookup. Every icon type starts out on the
    /// [`Region::Icon`] node; see [`with_icons`](Self::with_icons).
    pub fn from_fn(mut f: impl FnMut(Region) -> NodeId) -> Self {
        let ids = Region::ALL.map(&mut f);
        let icons = [ids[Region::Icon.slot()]; ICON_TYPES.len()];
        Self { ids, icons }
    }

    /// Set the per-type icon nodes, in [`ICON_TYPES`] order.
    #[must_use]
    pub fn with_icons(mut self, icons: [NodeId; ICON_TYPES.len()]) -> Self {
        self.icons = icons;
        self
    }

    /// All icon nodes, in [`ICON_TYPES`] order.
    pub fn icons(&self) -> &[NodeId] {
        &self.icons
    }

    /// Icon node of `kind` (an [`ICON_TYPES`] entry).
    pub fn icon(&self, kind: &str) -> Option<NodeId> {
        let at = ICON_TYPES.iter().position(|&t| t == kind)?;
        Some(self.icons[at])
    }

    /// Point [`Region::Icon`] at `node`. Ignored unless `node` is one of the
    /// icon nodes.
    pub fn select_icon(&mut self, node: NodeId) {
        if self.icons.contains(&node) {
            self.ids[Region::Icon.slot()] = node;
        }
    }

    /// Node of `region`.
    #[inline]
    pub fn get(&self, region: Region) -> NodeId {
        self.ids[region.slot()]
    }

    /// Root node (the container).
    #[inline]
    pub fn root(&self) -> NodeId {
        self.get(Region::Container)
    }

    /// The dialog element.
    #[inline]
    pub fn popup(&self) -> NodeId {
        self.get(Region::Popup)
    }

    /// Iterate `(region, node)` pairs in skeleton order.
    pub fn iter(&self) -> impl Iterator<Item = (Region, NodeId)> + '_ {
        Region::ALL.into_iter().map(|r| (r, self.get(r)))
    }

    /// Region owning `node` exactly, if any.
    pub fn region_of(&self, node: NodeId) -> Option<Region> {
        self.iter().find(|&(_, n)| n == node).map(|(r, _)| r)
    }
}
