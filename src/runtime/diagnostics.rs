use crate::error::Error;

/// Recoverable faults recorded during one run
///
/// Faults accumulate in the order they were raised. The most recent one is
/// the "current" error code, with 0 meaning no fault has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    faults: Vec<Error>,
}

impl Diagnostics {
    /// Creates an empty fault list
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault
    pub fn report(&mut self, error: Error) {
        tracing::debug!(code = error.code(), line = error.line(), "{}", error);
        self.faults.push(error);
    }

    /// Code of the most recent fault, 0 if none
    pub fn current_code(&self) -> u32 {
        self.faults.last().map_or(0, Error::code)
    }

    /// Source line of the most recent fault, 0 if none
    pub fn current_line(&self) -> usize {
        self.faults.last().map_or(0, Error::line)
    }

    /// True when nothing has been recorded
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Number of recorded faults
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Recorded faults in order
    pub fn faults(&self) -> &[Error] {
        &self.faults
    }

    /// Iterates over recorded faults
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.faults.iter()
    }

    /// Number of faults with the given code
    pub fn count_code(&self, code: u32) -> usize {
        self.faults.iter().filter(|e| e.code() == code).count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
