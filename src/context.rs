//! Discovery path threaded through the reachability traversal.
//!
//! A [`ContextPath`] is a persistent linked list borrowed from its parent: pushing builds a new
//! value one frame longer, and the frame is gone once that value goes out of scope. There is no
//! shared mutable stack to pop, so every exit path (including `?`) restores the parent path.

use crate::decoration::{Decorate, TypeOccurrence};
use crate::error::{Error, Result};
use std::fmt;

/// One element on the discovery path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Endpoint(String),
    Operation(String),
    Parameter(String),
    Representation(String),
    DataType(String),
    Field(String),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Endpoint(name)
            | Frame::Operation(name)
            | Frame::Parameter(name)
            | Frame::DataType(name)
            | Frame::Field(name) => write!(f, "{}", name),
            Frame::Representation(name) => write!(f, "returns {}", name),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextPath<'a> {
    frame: Option<&'a Frame>,
    parent: Option<&'a ContextPath<'a>>,
    depth: usize,
}

impl Default for ContextPath<'_> {
    fn default() -> Self {
        Self::root()
    }
}

impl<'a> ContextPath<'a> {
    pub fn root() -> Self {
        ContextPath {
            frame: None,
            parent: None,
            depth: 0,
        }
    }

    pub fn push<'b>(&'b self, frame: &'b Frame) -> ContextPath<'b>
    where
        'a: 'b,
    {
        ContextPath {
            frame: Some(frame),
            parent: Some(self),
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Frames from the outermost to the current one.
    pub fn frames(&self) -> Vec<&'a Frame> {
        let mut frames = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(path) = current {
            if let Some(frame) = path.frame {
                frames.push(frame);
            }
            current = path.parent;
        }
        frames.reverse();
        frames
    }

    pub fn render(&self) -> String {
        self.frames()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Decorates `ty`, turning an unsupported type into a traversal error located at this path.
    pub fn decorate(&self, ty: &impl Decorate) -> Result<TypeOccurrence> {
        ty.decorate().map_err(|source| Error::Traversal {
            path: self.render(),
            source,
        })
    }
}

impl fmt::Display for ContextPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::{DecorationError, TypeRef};

    #[test]
    fn test_push_and_implicit_pop() {
        let root = ContextPath::root();
        let endpoint = Frame::Endpoint("WidgetResource".to_string());
        let operation = Frame::Operation("get_widget".to_string());

        let at_endpoint = root.push(&endpoint);
        {
            let at_operation = at_endpoint.push(&operation);
            assert_eq!(at_operation.depth(), 2);
            assert_eq!(at_operation.render(), "WidgetResource -> get_widget");
        }
        assert_eq!(at_endpoint.depth(), 1);
        assert_eq!(at_endpoint.render(), "WidgetResource");
        assert!(root.is_empty());
        assert_eq!(root.render(), "");
    }

    #[test]
    fn test_representation_frame_display() {
        let root = ContextPath::root();
        let frame = Frame::Representation("Widget".to_string());
        assert_eq!(root.push(&frame).to_string(), "returns Widget");
    }

    #[test]
    fn test_decorate_failure_reports_path() {
        let root = ContextPath::root();
        let endpoint = Frame::Endpoint("WidgetResource".to_string());
        let operation = Frame::Operation("create".to_string());
        let parameter = Frame::Parameter("callback".to_string());
        let at_endpoint = root.push(&endpoint);
        let at_operation = at_endpoint.push(&operation);
        let path = at_operation.push(&parameter);

        let ty = TypeRef::new(syn::parse_str("fn()").unwrap(), vec![]);
        match path.decorate(&ty) {
            Err(Error::Traversal { path, source }) => {
                assert_eq!(path, "WidgetResource -> create -> callback");
                assert_eq!(source, DecorationError::UnsupportedKind("function pointer"));
            }
            other => panic!("Expected traversal error, got {:?}", other),
        }
    }
}
