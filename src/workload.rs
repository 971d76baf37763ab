use std::io;

/// One opaque unit of work timed by the harness.
///
/// An invocation must acquire and release everything it touches (file handles, mappings,
/// buffers) before returning, so the measured cost covers the full resource lifecycle and
/// nothing accumulates across a batch. Errors are fatal to the benchmark run.
pub trait Workload {
    fn invoke(&mut self) -> io::Result<()>;
}

impl<F> Workload for F
where
    F: FnMut() -> io::Result<()>,
{
    #[inline]
    fn invoke(&mut self) -> io::Result<()> {
        self()
    }
}
