//! How a command ended.

/// The result of one `respond_to_command` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The module was already solved.
    Ignored,
    /// Another command is still running on this module.
    AlreadyProcessing,
    /// A camera meta-command handled the text.
    MetaHandled,
    /// An admin solved the module.
    ForceSolved,
    /// The module accepts no commands.
    Unsupported,
    /// The command was not understood.
    Unrecognized,
    /// The handler's first step solved or struck the module; it was only
    /// shown briefly.
    Courtesy,
    /// The handler failed before running and the module was solved.
    Faulted,
    /// The active run finished.
    Completed {
        /// Whether anything in the run counted as a response.
        responded: bool,
    },
}
