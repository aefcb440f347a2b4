//! Fragment stream contract and in-memory stream utilities.
//!
//! ```rust
//! use mprovider::{BoxedFragmentStream, Fragment, VecFragmentStream};
//!
//! let stream = VecFragmentStream::new(vec![Fragment::text("hello"), Fragment::done()]);
//! let _boxed: BoxedFragmentStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

/// One increment of a streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub image_url: Option<String>,
    pub is_done: bool,
    pub is_error: bool,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Empty terminal fragment.
    pub fn done() -> Self {
        Self {
            is_done: true,
            ..Self::default()
        }
    }

    /// Terminal fragment carrying an explanation in place of a reply.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_done: true,
            is_error: true,
            ..Self::default()
        }
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn finished(mut self) -> Self {
        self.is_done = true;
        self
    }
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Fragments are emitted in source order.
/// - At most one fragment has `is_done` set and it is the last one yielded.
/// - A fragment with `is_error` set is always terminal.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait FragmentStream: Stream<Item = Fragment> + Send {}

impl<T> FragmentStream for T where T: Stream<Item = Fragment> + Send {}

pub type BoxedFragmentStream<'a> = Pin<Box<dyn FragmentStream + 'a>>;

#[derive(Debug)]
pub struct VecFragmentStream {
    fragments: VecDeque<Fragment>,
}

impl VecFragmentStream {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            fragments: fragments.into(),
        }
    }
}

impl Stream for VecFragmentStream {
    type Item = Fragment;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Fragment>> {
        Poll::Ready(self.fragments.pop_front())
    }
}
