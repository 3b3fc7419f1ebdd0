use std::time::Duration;

/// Various options that can be passed to the recoverer. Options change how
/// far recovery goes before it stops.
#[derive(Clone, Debug)]
pub struct Options {
    recurse: bool,
    deadline: Option<Duration>,
    max_functions: Option<usize>,
    max_instructions: Option<usize>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            recurse: true,
            deadline: None,
            max_functions: None,
            max_instructions: None,
        }
    }
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// Whether the targets of calls are recovered as functions too.
    ///
    /// Call targets are always recorded in `xrefs`. When this is false they
    /// are not decoded. By default this is true.
    pub fn recurse(&self) -> bool {
        self.recurse
    }

    pub fn set_recurse(&mut self, recurse: bool) {
        self.recurse = recurse;
    }

    /// How long one call to recover may run before it gives up.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// The most functions one call to recover may create.
    pub fn max_functions(&self) -> Option<usize> {
        self.max_functions
    }

    pub fn set_max_functions(&mut self, max_functions: Option<usize>) {
        self.max_functions = max_functions;
    }

    /// The most instructions one call to recover may decode.
    pub fn max_instructions(&self) -> Option<usize> {
        self.max_instructions
    }

    pub fn set_max_instructions(&mut self, max_instructions: Option<usize>) {
        self.max_instructions = max_instructions;
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `recovery::Options`
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder for recovery options.
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    pub fn recurse(mut self, recurse: bool) -> OptionsBuilder {
        self.options.recurse = recurse;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> OptionsBuilder {
        self.options.deadline = Some(deadline);
        self
    }

    pub fn max_functions(mut self, max_functions: usize) -> OptionsBuilder {
        self.options.max_functions = Some(max_functions);
        self
    }

    pub fn max_instructions(mut self, max_instructions: usize) -> OptionsBuilder {
        self.options.max_instructions = Some(max_instructions);
        self
    }

    /// Get the options from this builder
    pub fn build(self) -> Options {
        self.options
    }
}
