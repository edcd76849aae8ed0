//! Tests for routing.

#[cfg(test)]
mod router_tests {
    use crate::parser::Method;
    use crate::router::{Error, PathTemplate, Router};

    #[test]
    fn test_literal_template_matches_exactly() {
        let template = PathTemplate::parse("/test").unwrap();
        assert!(template.matches("/test").unwrap().is_empty());
        assert!(template.matches("/test/").is_none());
        assert!(template.matches("/tests").is_none());
        assert!(template.matches("/").is_none());
    }

    #[test]
    fn test_parameter_binds_one_segment() {
        let template = PathTemplate::parse("/test/{param}").unwrap();
        let params = template.matches("/test/World").unwrap();
        assert_eq!(params.get("param").unwrap(), "World");

        assert!(template.matches("/test/World/again").is_none());
        assert!(template.matches("/test/").is_none());
        assert!(template.matches("/test").is_none());
    }

    #[test]
    fn test_multiple_parameters() {
        let template = PathTemplate::parse("/users/{user}/posts/{post}").unwrap();
        let names: Vec<&str> = template.param_names().collect();
        assert_eq!(names, vec!["user", "post"]);

        let params = template.matches("/users/42/posts/7").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["user"], "42");
        assert_eq!(params["post"], "7");
    }

    #[test]
    fn test_every_concrete_path_binds_its_values() {
        let template = PathTemplate::parse("/a/{x}/b/{y}").unwrap();
        for (x, y) in [("1", "2"), ("hello", "world"), ("%20", "-"), ("x.y", "z_w")] {
            let params = template.matches(&format!("/a/{x}/b/{y}")).unwrap();
            assert_eq!(params["x"], x);
            assert_eq!(params["y"], y);
        }
    }

    #[test]
    fn test_root_template() {
        let template = PathTemplate::parse("/").unwrap();
        assert!(template.matches("/").is_some());
        assert!(template.matches("/x").is_none());
    }

    #[test]
    fn test_template_errors() {
        assert_eq!(
            PathTemplate::parse("test"),
            Err(Error::MissingLeadingSlash("test".to_string()))
        );
        assert_eq!(
            PathTemplate::parse("/a/{}"),
            Err(Error::EmptyParameter("/a/{}".to_string()))
        );
        assert!(matches!(
            PathTemplate::parse("/a/{id"),
            Err(Error::InvalidSegment { ref segment, .. }) if segment == "{id"
        ));
        assert!(matches!(
            PathTemplate::parse("/a/x{id}"),
            Err(Error::InvalidSegment { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{id}/{id}"),
            Err(Error::DuplicateParameter { ref name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_router_matches_method_and_path() {
        let router = Router::builder()
            .route(Method::POST, "/test/{param}", "echo")
            .route(Method::GET, "/test", "fail")
            .build()
            .unwrap();

        let found = router.match_route(Method::POST, "/test/World").unwrap();
        assert_eq!(*found.handler, "echo");
        assert_eq!(found.params["param"], "World");

        let found = router.match_route(Method::GET, "/test").unwrap();
        assert_eq!(*found.handler, "fail");
        assert!(found.params.is_empty());

        // Right path, wrong method, is a miss
        assert!(router.match_route(Method::GET, "/test/World").is_none());
        assert!(router.match_route(Method::GET, "/missing").is_none());
    }

    #[test]
    fn test_first_registered_route_wins() {
        let router = Router::builder()
            .route(Method::GET, "/items/{id}", 1)
            .route(Method::GET, "/items/new", 2)
            .route(Method::GET, "/items/{other}", 3)
            .build()
            .unwrap();

        let found = router.match_route(Method::GET, "/items/new").unwrap();
        assert_eq!(*found.handler, 1);
        assert_eq!(found.params["id"], "new");
    }

    #[test]
    fn test_builder_reports_first_error() {
        let result = Router::builder()
            .route(Method::GET, "/ok", ())
            .route(Method::GET, "bad", ())
            .route(Method::GET, "/{a}/{a}", ())
            .build();
        assert_eq!(result.unwrap_err(), Error::MissingLeadingSlash("bad".to_string()));
    }

    #[test]
    fn test_routes_are_listed_in_order() {
        let router = Router::builder()
            .route(Method::GET, "/one", ())
            .route(Method::POST, "/two/{x}", ())
            .build()
            .unwrap();

        let listed: Vec<String> = router
            .routes()
            .map(|route| format!("{} {}", route.method, route.template))
            .collect();
        assert_eq!(listed, vec!["GET /one", "POST /two/{x}"]);
        assert_eq!(router.len(), 2);
        assert!(!router.is_empty());
        assert!(Router::<()>::default().is_empty());
    }
}
