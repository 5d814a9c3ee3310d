//! Filesystem facade: the operation surface shared by sync and async callers

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::FsResult;
use crate::types::{HandleId, Stats};

/// Completion of an operation that already ran.
///
/// The first poll always returns `Pending` (after waking the task), so the
/// result is only observable after the caller has yielded once.
#[must_use = "the operation has run; await the result to observe it"]
#[derive(Debug)]
pub struct Deferred<T> {
    output: Option<T>,
    yielded: bool,
}

impl<T> Deferred<T> {
    pub(crate) fn new(output: T) -> Self {
        Self {
            output: Some(output),
            yielded: false,
        }
    }
}

// The output is moved out, never pinned.
impl<T> Unpin for Deferred<T> {}

impl<T> Future for Deferred<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if !this.yielded {
            this.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        match this.output.take() {
            Some(output) => Poll::Ready(output),
            None => panic!("`Deferred` polled after completion"),
        }
    }
}

/// Operations a simulated filesystem serves.
///
/// Synchronous methods return their result directly. The `_async` forms, and
/// `open`/`read`/`close`, do the same work during the call and hand back a
/// [`Deferred`] completion.
pub trait FileSystem {
    /// Target of the symlink at `path`, or `path` itself when it is not a link.
    fn realpath(&self, path: &str) -> FsResult<String>;

    /// Child names of the directory at `path`, in insertion order.
    fn readdir(&self, path: &str) -> FsResult<Vec<String>>;

    fn read_file(&self, path: &str) -> FsResult<Vec<u8>>;

    /// Create or replace a file. Every ancestor must already exist.
    fn write_file(&mut self, path: &str, data: &[u8]) -> FsResult<()>;

    /// Create an empty directory. The parent must exist and the name must be free.
    fn mkdir(&mut self, path: &str) -> FsResult<()>;

    fn stat(&self, path: &str) -> FsResult<Stats>;

    /// Like `stat`, but reports a trailing symlink itself.
    fn lstat(&self, path: &str) -> FsResult<Stats>;

    fn open(&mut self, path: &str) -> Deferred<FsResult<HandleId>>;

    /// Copy up to `length` bytes from the handle into `buf[offset..]`, starting
    /// at `position` or at the handle's cursor when `None`.
    fn read(
        &mut self,
        handle: HandleId,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<u64>,
    ) -> Deferred<FsResult<usize>>;

    fn close(&mut self, handle: HandleId) -> Deferred<FsResult<()>>;

    fn realpath_async(&self, path: &str) -> Deferred<FsResult<String>> {
        Deferred::new(self.realpath(path))
    }

    fn readdir_async(&self, path: &str) -> Deferred<FsResult<Vec<String>>> {
        Deferred::new(self.readdir(path))
    }

    fn read_file_async(&self, path: &str) -> Deferred<FsResult<Vec<u8>>> {
        Deferred::new(self.read_file(path))
    }

    fn write_file_async(&mut self, path: &str, data: &[u8]) -> Deferred<FsResult<()>> {
        Deferred::new(self.write_file(path, data))
    }

    fn mkdir_async(&mut self, path: &str) -> Deferred<FsResult<()>> {
        Deferred::new(self.mkdir(path))
    }

    fn stat_async(&self, path: &str) -> Deferred<FsResult<Stats>> {
        Deferred::new(self.stat(path))
    }

    fn lstat_async(&self, path: &str) -> Deferred<FsResult<Stats>> {
        Deferred::new(self.lstat(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn test_first_poll_is_pending() {
        assert_eq!(Deferred::new(7).now_or_never(), None);
    }

    #[tokio::test]
    async fn test_resolves_after_yield() {
        let mut deferred = Deferred::new("done");
        assert!(futures::poll!(&mut deferred).is_pending());
        assert_eq!(futures::poll!(&mut deferred), Poll::Ready("done"));
    }

    #[tokio::test]
    async fn test_await() {
        assert_eq!(Deferred::new(3).await, 3);
    }
}
