//! Global and per-route declarations.
//!
//! A [`GlobalSpec`] holds what every route of a bundle shares: the named
//! auth strategies, middleware around auth negotiation, and validation
//! defaults. A [`RouteSpec`] declares what one route accepts and returns.
//! [`GlobalSpec::route`] combines the two with a handler into a
//! [`Route`](crate::Route).

use hermes_config::DispatchConfig;
use hermes_core::{Error, ResponseSchemas, Result, SchemaRef};
use hermes_middleware::{ArrayFormat, AuthFailureHandler, BoxedMiddleware, InputSchemas, Middleware};
use http::Method;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Which auth strategies a route accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthRequirement {
    /// The route declares nothing; no strategy runs.
    #[default]
    Unspecified,
    /// The route is explicitly public.
    None,
    /// Exactly one strategy must accept the request.
    Single(String),
    /// Any one of these strategies may accept the request.
    AnyOf(Vec<String>),
}

impl AuthRequirement {
    /// Returns `true` if the strategy `name` is acceptable.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::Unspecified | Self::None => false,
            Self::Single(single) => single == name,
            Self::AnyOf(names) => names.iter().any(|n| n == name),
        }
    }

    /// Returns the strategy names the route asks for.
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Unspecified | Self::None => &[],
            Self::Single(single) => std::slice::from_ref(single),
            Self::AnyOf(names) => names,
        }
    }
}

impl From<&str> for AuthRequirement {
    fn from(name: &str) -> Self {
        if name == "none" {
            Self::None
        } else {
            Self::Single(name.to_string())
        }
    }
}

impl<S: Into<String>> FromIterator<S> for AuthRequirement {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::AnyOf(iter.into_iter().map(Into::into).collect())
    }
}

/// Settings shared by every route of a bundle.
///
/// # Example
///
/// ```
/// use hermes::GlobalSpec;
/// use hermes_middleware::builtins::{BearerAuth, RequestLogging};
/// use hermes_core::{CallerIdentity, Error};
///
/// let global = GlobalSpec::new()
///     .auth_strategy("bearer", BearerAuth::new(|token: &str| {
///         if token == "secret" {
///             Ok(CallerIdentity::user("u-1"))
///         } else {
///             Err(Error::unauthorized("bad token"))
///         }
///     }))
///     .before_auth(RequestLogging::new());
///
/// assert_eq!(global.strategy_names().collect::<Vec<_>>(), vec!["bearer"]);
/// ```
#[derive(Clone)]
pub struct GlobalSpec {
    pub(crate) auth_strategies: IndexMap<String, BoxedMiddleware>,
    pub(crate) before_auth: Vec<BoxedMiddleware>,
    pub(crate) after_auth: Vec<BoxedMiddleware>,
    pub(crate) on_all_auth_failed: Option<AuthFailureHandler>,
    pub(crate) validate_responses: bool,
    pub(crate) array_formats: Vec<ArrayFormat>,
}

impl Default for GlobalSpec {
    fn default() -> Self {
        Self {
            auth_strategies: IndexMap::new(),
            before_auth: Vec::new(),
            after_auth: Vec::new(),
            on_all_auth_failed: None,
            validate_responses: true,
            array_formats: ArrayFormat::ALL.to_vec(),
        }
    }
}

impl GlobalSpec {
    /// Creates a spec with no strategies and response validation on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spec from the dispatch section of the configuration.
    pub fn from_config(config: &DispatchConfig) -> Result<Self> {
        let array_formats = config
            .supported_array_formats
            .iter()
            .map(|f| f.parse())
            .collect::<Result<Vec<ArrayFormat>>>()?;
        if array_formats.is_empty() {
            return Err(Error::configuration("at least one query array format is required"));
        }
        Ok(Self {
            validate_responses: config.validate_responses,
            array_formats,
            ..Self::default()
        })
    }

    /// Registers a named auth strategy. Registration order is trial order.
    #[must_use]
    pub fn auth_strategy<M: Middleware>(self, name: impl Into<String>, strategy: M) -> Self {
        self.auth_strategy_boxed(name, Arc::new(strategy))
    }

    /// Registers an already shared auth strategy.
    #[must_use]
    pub fn auth_strategy_boxed(mut self, name: impl Into<String>, strategy: BoxedMiddleware) -> Self {
        self.auth_strategies.insert(name.into(), strategy);
        self
    }

    /// Appends middleware that runs before auth negotiation.
    #[must_use]
    pub fn before_auth<M: Middleware>(mut self, middleware: M) -> Self {
        self.before_auth.push(Arc::new(middleware));
        self
    }

    /// Appends middleware that runs after a strategy accepted the request.
    #[must_use]
    pub fn after_auth<M: Middleware>(mut self, middleware: M) -> Self {
        self.after_auth.push(Arc::new(middleware));
        self
    }

    /// Sets the default callback for when every strategy of a route rejects.
    #[must_use]
    pub fn on_all_auth_failed<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[Error]) -> Result<()> + Send + Sync + 'static,
    {
        self.on_all_auth_failed = Some(Arc::new(handler));
        self
    }

    /// Enables or disables response validation for every route by default.
    #[must_use]
    pub fn validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = validate;
        self
    }

    /// Sets the accepted query array formats.
    #[must_use]
    pub fn array_formats(mut self, formats: impl IntoIterator<Item = ArrayFormat>) -> Self {
        self.array_formats = formats.into_iter().collect();
        self
    }

    /// Returns the registered strategy names in trial order.
    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.auth_strategies.keys().map(String::as_str)
    }

    /// Resolves a route's requirement to strategies, in registration order.
    pub(crate) fn strategies_for(
        &self,
        requirement: &AuthRequirement,
    ) -> Result<Vec<(String, BoxedMiddleware)>> {
        if let Some(unknown) = requirement
            .names()
            .iter()
            .find(|name| !self.auth_strategies.contains_key(name.as_str()))
        {
            return Err(Error::configuration(format!(
                "route requires unknown auth strategy {unknown:?}"
            )));
        }

        Ok(self
            .auth_strategies
            .iter()
            .filter(|(name, _)| requirement.accepts(name))
            .map(|(name, strategy)| (name.clone(), Arc::clone(strategy)))
            .collect())
    }
}

impl fmt::Debug for GlobalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalSpec")
            .field("auth_strategies", &self.strategy_names().collect::<Vec<_>>())
            .field("before_auth", &self.before_auth.len())
            .field("after_auth", &self.after_auth.len())
            .field("on_all_auth_failed", &self.on_all_auth_failed.is_some())
            .field("validate_responses", &self.validate_responses)
            .field("array_formats", &self.array_formats)
            .finish()
    }
}

/// What one route accepts and returns.
///
/// # Example
///
/// ```
/// use hermes::RouteSpec;
/// use hermes_core::JsonSchema;
/// use http::Method;
/// use serde_json::json;
///
/// let spec = RouteSpec::new([Method::GET])
///     .auth("bearer")
///     .query_params(JsonSchema::shared(json!({ "type": "object" })).unwrap());
/// assert_eq!(spec.methods(), &[Method::GET]);
/// ```
#[derive(Clone, Default)]
pub struct RouteSpec {
    pub(crate) methods: Vec<Method>,
    pub(crate) input: InputSchemas,
    pub(crate) responses: ResponseSchemas,
    pub(crate) auth: AuthRequirement,
    pub(crate) middleware: Vec<BoxedMiddleware>,
    pub(crate) on_all_auth_failed: Option<AuthFailureHandler>,
    pub(crate) validate_response: Option<bool>,
}

impl RouteSpec {
    /// Creates a spec accepting `methods`, in declaration order.
    #[must_use]
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Returns the accepted methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the auth requirement.
    #[must_use]
    pub const fn auth_requirement(&self) -> &AuthRequirement {
        &self.auth
    }

    /// Sets the auth requirement. `"none"` marks the route public.
    #[must_use]
    pub fn auth(mut self, requirement: impl Into<AuthRequirement>) -> Self {
        self.auth = requirement.into();
        self
    }

    /// Accepts any one of several strategies.
    #[must_use]
    pub fn auth_any<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth = names.into_iter().collect();
        self
    }

    /// Validates the JSON body.
    #[must_use]
    pub fn json_body(mut self, schema: SchemaRef) -> Self {
        self.input.json_body = Some(schema);
        self
    }

    /// Validates the query parameters.
    #[must_use]
    pub fn query_params(mut self, schema: SchemaRef) -> Self {
        self.input.query_params = Some(schema);
        self
    }

    /// Validates the query merged with the body.
    #[must_use]
    pub fn common_params(mut self, schema: SchemaRef) -> Self {
        self.input.common_params = Some(schema);
        self
    }

    /// Validates the route parameters.
    #[must_use]
    pub fn route_params(mut self, schema: SchemaRef) -> Self {
        self.input.route_params = Some(schema);
        self
    }

    /// Validates a URL-encoded form body.
    #[must_use]
    pub fn url_encoded_form_data(mut self, schema: SchemaRef) -> Self {
        self.input.url_encoded_form_data = Some(schema);
        self
    }

    /// Validates a multipart form body.
    #[must_use]
    pub fn multipart_form_data(mut self, schema: SchemaRef) -> Self {
        self.input.multipart_form_data = Some(schema);
        self
    }

    /// Sets the schema for JSON replies.
    #[must_use]
    pub fn json_response(mut self, schema: SchemaRef) -> Self {
        self.responses.json = Some(schema);
        self
    }

    /// Sets the schema for multipart replies.
    #[must_use]
    pub fn multipart_response(mut self, schema: SchemaRef) -> Self {
        self.responses.multipart = Some(schema);
        self
    }

    /// Registers a custom reply content type and its schema.
    #[must_use]
    pub fn custom_response(mut self, content_type: impl Into<String>, schema: SchemaRef) -> Self {
        self.responses.custom.insert(content_type.into(), schema);
        self
    }

    /// Appends route-local middleware, run after the global after-auth list.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends already shared route-local middleware.
    #[must_use]
    pub fn middleware_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Sets the callback for when every strategy rejects, replacing the
    /// global default for this route.
    #[must_use]
    pub fn on_all_auth_failed<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[Error]) -> Result<()> + Send + Sync + 'static,
    {
        self.on_all_auth_failed = Some(Arc::new(handler));
        self
    }

    /// Overrides the global response-validation default for this route.
    #[must_use]
    pub fn validate_response(mut self, validate: bool) -> Self {
        self.validate_response = Some(validate);
        self
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("methods", &self.methods)
            .field("input", &self.input)
            .field("responses", &self.responses)
            .field("auth", &self.auth)
            .field("middleware", &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("validate_response", &self.validate_response)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_middleware::FnMiddleware;

    fn strategy(name: &'static str) -> BoxedMiddleware {
        FnMiddleware::new(name, |ctx, req, next| Box::pin(next.run(ctx, req))).boxed()
    }

    fn global() -> GlobalSpec {
        GlobalSpec::new()
            .auth_strategy_boxed("session", strategy("session"))
            .auth_strategy_boxed("bearer", strategy("bearer"))
            .auth_strategy_boxed("api_key", strategy("api_key"))
    }

    #[test]
    fn test_auth_requirement_from_str() {
        assert_eq!(AuthRequirement::from("none"), AuthRequirement::None);
        assert_eq!(
            AuthRequirement::from("bearer"),
            AuthRequirement::Single("bearer".to_string())
        );
        assert!(AuthRequirement::from("bearer").accepts("bearer"));
        assert!(!AuthRequirement::None.accepts("none"));
    }

    #[test]
    fn test_strategies_follow_global_order() {
        let requirement: AuthRequirement = ["api_key", "session"].into_iter().collect();
        let names: Vec<String> = global()
            .strategies_for(&requirement)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["session", "api_key"]);
    }

    #[test]
    fn test_public_routes_get_no_strategies() {
        assert!(global().strategies_for(&AuthRequirement::None).unwrap().is_empty());
        assert!(global()
            .strategies_for(&AuthRequirement::Unspecified)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_strategy_is_configuration_error() {
        let result = global().strategies_for(&AuthRequirement::from("oauth"));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_from_config() {
        let config = DispatchConfig {
            validate_responses: false,
            supported_array_formats: vec!["comma".to_string()],
            ..DispatchConfig::default()
        };
        let spec = GlobalSpec::from_config(&config).unwrap();
        assert!(!spec.validate_responses);
        assert_eq!(spec.array_formats, vec![ArrayFormat::Comma]);

        let bad = DispatchConfig {
            supported_array_formats: vec!["pipes".to_string()],
            ..DispatchConfig::default()
        };
        assert!(GlobalSpec::from_config(&bad).is_err());
    }

    #[test]
    fn test_route_spec_builder() {
        let spec = RouteSpec::new([Method::GET, Method::POST])
            .auth_any(["session", "bearer"])
            .validate_response(false);
        assert_eq!(spec.methods(), &[Method::GET, Method::POST]);
        assert_eq!(spec.auth_requirement().names().len(), 2);
        assert_eq!(spec.validate_response, Some(false));
    }
}
