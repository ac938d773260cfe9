use axum::http::{Method, StatusCode};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde_json::Value;

use crate::domain::{Describe, TypeDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Wildcard,
}

fn parse_segments(path: &str) -> Vec<Segment> {
    split_path(path)
        .map(|segment| {
            if segment.starts_with('*') || segment.starts_with("{*") {
                Segment::Wildcard
            } else if segment.starts_with(':')
                || (segment.starts_with('{') && segment.ends_with('}'))
            {
                Segment::Param
            } else {
                Segment::Literal(segment.to_string())
            }
        })
        .collect()
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

/// Mock metadata for one route: what to answer when its handler signals.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub response: Option<TypeDescriptor>,
    pub example: Option<Value>,
    pub examples: Vec<Value>,
    segments: Vec<Segment>,
}

impl MockRoute {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            segments: parse_segments(&path),
            method,
            path,
            status: StatusCode::OK,
            response: None,
            example: None,
            examples: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn response(mut self, descriptor: TypeDescriptor) -> Self {
        self.response = Some(descriptor);
        self
    }

    pub fn response_type<T: Describe>(self) -> Self {
        self.response(T::describe())
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Take `example` / `examples` from OpenAPI operation extras.
    pub fn openapi_extra(mut self, extra: &Value) -> Self {
        if let Some(example) = extra.get("example") {
            self.example = Some(example.clone());
        }
        if let Some(examples) = extra.get("examples").and_then(Value::as_array) {
            self.examples = examples.clone();
        }
        self
    }

    /// A route-level example, chosen at random among several.
    pub fn pick_example(&self, rng: &mut dyn RngCore) -> Option<Value> {
        self.example
            .clone()
            .or_else(|| self.examples.choose(rng).cloned())
    }

    /// Whether method and path both match.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.matches_path(path)
    }

    fn matches_path(&self, path: &str) -> bool {
        let mut requested = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return requested.next().is_some(),
                Segment::Param => {
                    if requested.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if requested.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        requested.next().is_none()
    }

    /// Template with capture names erased; equal shapes match the same paths.
    pub fn shape(&self) -> String {
        let segments: Vec<&str> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => literal.as_str(),
                Segment::Param => "{}",
                Segment::Wildcard => "*",
            })
            .collect();
        format!("/{}", segments.join("/"))
    }
}

/// Ordered set of mock routes; the first full match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<MockRoute>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = MockRoute>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    pub fn push(&mut self, route: MockRoute) {
        self.routes.push(route);
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&MockRoute> {
        self.routes.iter().find(|route| route.matches(method, path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MockRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
