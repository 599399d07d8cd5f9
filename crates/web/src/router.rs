//! Route registry: a static map for literal paths plus a hand-rolled trie for paths with
//! parameter segments.
//!
//! Grounded directly on the original's `route_handler.hpp`: two coexisting structures rather
//! than one generic radix tree. `matchit` (used by the teacher's router) was considered and
//! rejected — its wildcard/priority matching cannot express this registry's specific contract:
//! literal segments always win over a parameter sibling, matching is greedy and never
//! backtracks once a branch is chosen, and registering two different parameter names at the
//! same position is a registration-time error rather than a priority tie-break.

use crate::error::RouteError;
use crate::handler::SharedHandlerFactory;
use http::Method;
use routine_http::{Params, Request};
use std::collections::HashMap;

/// Recognizes a `{name}` path-parameter segment, returning its bare name.
fn parameter_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}'))
}

/// One node of the dynamic-route trie.
///
/// `param_child` holds at most one parameter branch: the original only ever tracks a single
/// parameter name per node and raises an error if a second, differently-named parameter is
/// registered at the same position.
#[derive(Default)]
struct Node {
    literal_children: HashMap<String, Node>,
    param_child: Option<(String, Box<Node>)>,
    handler: Option<SharedHandlerFactory>,
}

impl Node {
    fn register(&mut self, segments: &[&str], full_path: &str, handler: SharedHandlerFactory) -> Result<(), RouteError> {
        match segments.split_first() {
            None => {
                if self.handler.is_some() {
                    return Err(RouteError::DuplicateRoute { method: String::new(), path: full_path.to_string() });
                }
                self.handler = Some(handler);
                Ok(())
            }
            Some((segment, rest)) => {
                if let Some(name) = parameter_name(segment) {
                    match &mut self.param_child {
                        Some((existing, node)) if existing == name => node.register(rest, full_path, handler),
                        Some((existing, _)) => Err(RouteError::ConflictingParameterName {
                            position: full_path.len() - segment.len(),
                            existing: existing.clone(),
                            attempted: name.to_string(),
                        }),
                        None => {
                            let mut node = Box::new(Node::default());
                            node.register(rest, full_path, handler)?;
                            self.param_child = Some((name.to_string(), node));
                            Ok(())
                        }
                    }
                } else {
                    self.literal_children
                        .entry(segment.to_string())
                        .or_default()
                        .register(rest, full_path, handler)
                }
            }
        }
    }

    /// Greedy, non-backtracking lookup: a literal child, if present, is always preferred over
    /// the parameter child at the same node. If the literal branch dead-ends, the match fails —
    /// the original does not retry via the parameter branch once a literal child was chosen.
    fn lookup(&self, segments: &[&str], params: &mut Params) -> Option<&SharedHandlerFactory> {
        match segments.split_first() {
            None => self.handler.as_ref(),
            Some((segment, rest)) => {
                if let Some(child) = self.literal_children.get(*segment) {
                    return child.lookup(rest, params);
                }
                if let Some((name, child)) = &self.param_child {
                    params.insert(name.clone(), (*segment).to_string());
                    return child.lookup(rest, params);
                }
                None
            }
        }
    }
}

/// Per-method static map + dynamic trie pair.
#[derive(Default)]
struct MethodTable {
    static_routes: HashMap<String, SharedHandlerFactory>,
    dynamic_routes: Node,
}

/// The route registry, built once via [`RouterBuilder`] and shared read-only across
/// connections thereafter.
#[derive(Default)]
pub struct Router {
    tables: HashMap<Method, MethodTable>,
}

impl Router {
    /// Resolves `method path` to a handler factory, populating `params` with any captured path
    /// segments. Static (literal, parameter-free) routes are checked first, matching the
    /// original's "check the hashmap before walking the trie" order.
    pub fn route(&self, method: &Method, path: &str) -> Option<(SharedHandlerFactory, Params)> {
        let table = self.tables.get(method)?;

        if let Some(factory) = table.static_routes.get(path) {
            return Some((factory.clone(), Params::new()));
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let factory = table.dynamic_routes.lookup(&segments, &mut params)?;
        Some((factory.clone(), params))
    }

    pub fn route_request(&self, request: &Request) -> Option<(SharedHandlerFactory, Params)> {
        self.route(&request.method, &request.path)
    }
}

/// Builder for [`Router`], following this crate family's fluent construction style.
#[derive(Default)]
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. `path` is a normalized path (see
    /// [`routine_http::Request::normalize_path`]) whose segments are either literals or
    /// `{name}` parameters; a path with no parameter segments is stored in the static map, a
    /// path with one or more is inserted into the trie.
    pub fn route(mut self, method: Method, path: &str, factory: SharedHandlerFactory) -> Result<Self, RouteError> {
        let normalized = routine_http::Request::normalize_path(path);
        let has_param = normalized.split('/').any(|s| parameter_name(s).is_some());

        let table = self.router.tables.entry(method.clone()).or_default();

        if has_param {
            let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
            table.dynamic_routes.register(&segments, &normalized, factory).map_err(|e| match e {
                RouteError::DuplicateRoute { path, .. } => RouteError::DuplicateRoute { method: method.to_string(), path },
                other => other,
            })?;
        } else {
            if table.static_routes.contains_key(&normalized) {
                return Err(RouteError::DuplicateRoute { method: method.to_string(), path: normalized });
            }
            table.static_routes.insert(normalized, factory);
        }

        Ok(self)
    }

    pub fn get(self, path: &str, factory: SharedHandlerFactory) -> Result<Self, RouteError> {
        self.route(Method::GET, path, factory)
    }

    pub fn post(self, path: &str, factory: SharedHandlerFactory) -> Result<Self, RouteError> {
        self.route(Method::POST, path, factory)
    }

    pub fn put(self, path: &str, factory: SharedHandlerFactory) -> Result<Self, RouteError> {
        self.route(Method::PUT, path, factory)
    }

    pub fn delete(self, path: &str, factory: SharedHandlerFactory) -> Result<Self, RouteError> {
        self.route(Method::DELETE, path, factory)
    }

    pub fn build(self) -> Router {
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerFactory, RequestHandler};
    use routine_http::{Response, Version};
    use std::sync::Arc;

    struct Noop;
    impl RequestHandler for Noop {
        fn process(&mut self, _request: Request) -> Option<Response> {
            None
        }
    }

    fn factory() -> SharedHandlerFactory {
        Arc::new(|| Noop)
    }

    #[test]
    fn static_route_matches_exact_path() {
        let router = RouterBuilder::new().get("/health", factory()).unwrap().build();
        let (_f, params) = router.route(&Method::GET, "/health").unwrap();
        assert!(params.is_empty());
        assert!(router.route(&Method::POST, "/health").is_none());
    }

    #[test]
    fn dynamic_route_captures_parameter() {
        let router = RouterBuilder::new().get("/users/{id}", factory()).unwrap().build();
        let (_f, params) = router.route(&Method::GET, "/users/42").unwrap();
        assert_eq!(params.get("id").unwrap().as_str(), "42");
    }

    #[test]
    fn literal_takes_priority_over_parameter_sibling() {
        let router = RouterBuilder::new()
            .get("/users/{id}", factory())
            .unwrap()
            .get("/users/me", factory())
            .unwrap()
            .build();

        let (_f, params) = router.route(&Method::GET, "/users/me").unwrap();
        assert!(params.is_empty(), "literal /users/me should win over {{id}} capture");

        let (_f, params) = router.route(&Method::GET, "/users/42").unwrap();
        assert_eq!(params.get("id").unwrap().as_str(), "42");
    }

    #[test]
    fn conflicting_parameter_names_are_rejected() {
        let result = RouterBuilder::new()
            .get("/users/{id}", factory())
            .unwrap()
            .get("/users/{name}/profile", factory());

        assert!(matches!(result, Err(RouteError::ConflictingParameterName { .. })));
    }

    #[test]
    fn duplicate_static_route_is_rejected() {
        let result = RouterBuilder::new().get("/health", factory()).unwrap().get("/health", factory());
        assert!(matches!(result, Err(RouteError::DuplicateRoute { .. })));
    }

    #[test]
    fn unmatched_path_returns_none() {
        let router = RouterBuilder::new().get("/health", factory()).unwrap().build();
        assert!(router.route(&Method::GET, "/missing").is_none());
    }

    #[test]
    fn route_request_reads_method_and_normalized_path() {
        let router = RouterBuilder::new().get("/a/b", factory()).unwrap().build();
        let request = Request::new(Method::GET, Version::HTTP_11, "/a/b");
        assert!(router.route_request(&request).is_some());
    }
}
