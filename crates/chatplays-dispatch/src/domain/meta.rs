//! Commands every module understands, recognized before its handler runs.

/// A reserved command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    /// Detach the module's camera.
    Unview,
    /// Give the module a camera; `pin` asks for a pinned one.
    View { pin: bool },
    /// Focus pulse.
    Show,
    /// Force-solve the module.
    Solve,
}

impl MetaCommand {
    /// Classifies `text`.
    ///
    /// `unview`, `view pin` and `show` match case-insensitively and whole;
    /// anything starting with `view` is a view request. `solve` must match
    /// exactly.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("unview") {
            return Some(Self::Unview);
        }
        if text
            .get(..4)
            .is_some_and(|head| head.eq_ignore_ascii_case("view"))
        {
            return Some(Self::View {
                pin: text.eq_ignore_ascii_case("view pin"),
            });
        }
        if text.eq_ignore_ascii_case("show") {
            return Some(Self::Show);
        }
        if text == "solve" {
            return Some(Self::Solve);
        }
        None
    }
}
