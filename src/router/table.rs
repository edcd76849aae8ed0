//! The immutable route table and its builder.

use std::collections::HashMap;

use crate::parser::Method;
use crate::router::error::Error;
use crate::router::template::PathTemplate;

/// One registered route.
#[derive(Debug)]
pub struct Route<H> {
    /// The method to match.
    pub method: Method,
    /// The path template to match.
    pub template: PathTemplate,
    /// The handler bound to this route.
    pub handler: H,
}

/// The result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched handler.
    pub handler: &'a H,
    /// Parameter values bound from the path.
    pub params: HashMap<String, String>,
}

/// A read-only table of routes, searched in registration order.
#[derive(Debug)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Router<H> {
    /// Start building a route table.
    pub fn builder() -> RouterBuilder<H> {
        RouterBuilder {
            routes: Vec::new(),
            error: None,
        }
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// `None` is a routing miss; callers answer it with 404.
    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route.template.matches(path).map(|params| RouteMatch {
                    handler: &route.handler,
                    params,
                })
            })
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

/// Collects routes; template errors are reported by [`RouterBuilder::build`].
pub struct RouterBuilder<H> {
    routes: Vec<Route<H>>,
    error: Option<Error>,
}

impl<H> RouterBuilder<H> {
    /// Register `handler` for `method` on `template`.
    pub fn route(mut self, method: Method, template: &str, handler: H) -> Self {
        if self.error.is_some() {
            return self;
        }
        match PathTemplate::parse(template) {
            Ok(template) => self.routes.push(Route {
                method,
                template,
                handler,
            }),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Finish the table, failing on the first invalid template.
    pub fn build(self) -> Result<Router<H>, Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(Router {
                routes: self.routes,
            }),
        }
    }
}
