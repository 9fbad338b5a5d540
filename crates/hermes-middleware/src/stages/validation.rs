//! Input validation stage.
//!
//! Parses the parts of the request that the route declares schemas for and
//! stores the validated values in [`Request::input`](hermes_core::Request::input)
//! before the handler runs. Any parse or schema failure raises a request
//! validation error, so a malformed request never reaches application code.
//!
//! Inputs are processed in this order: route params, query params, JSON
//! body, URL-encoded form, multipart form, common params. Common params are
//! the query merged with the body object (body keys win) for methods that
//! carry a body, and the query alone otherwise.
//!
//! # Query arrays
//!
//! Array-valued query fields can be encoded three ways, each of which can be
//! enabled or disabled through [`ArrayFormat`]:
//!
//! | format     | example                 |
//! |------------|-------------------------|
//! | `brackets` | `?ids[]=1&ids[]=2`      |
//! | `comma`    | `?ids=1,2`              |
//! | `repeat`   | `?ids=1&ids=2`          |
//!
//! Comma splitting only applies to fields the schema reports as arrays
//! through [`Schema::is_array_field`]; a single value for such a field is
//! wrapped in a one-element array.

use crate::middleware::{BoxFuture, Middleware, Next};
use bytes::Bytes;
use hermes_core::{
    Context, Error, MultipartValue, Reply, Request, Result, Schema, SchemaRef,
};
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A query-string convention for array-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    /// `ids[]=1&ids[]=2`
    Brackets,
    /// `ids=1,2`
    Comma,
    /// `ids=1&ids=2`
    Repeat,
}

impl ArrayFormat {
    /// Every format, the default set.
    pub const ALL: [Self; 3] = [Self::Brackets, Self::Comma, Self::Repeat];

    /// Returns the lowercase name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brackets => "brackets",
            Self::Comma => "comma",
            Self::Repeat => "repeat",
        }
    }
}

impl fmt::Display for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brackets" => Ok(Self::Brackets),
            "comma" => Ok(Self::Comma),
            "repeat" => Ok(Self::Repeat),
            other => Err(Error::configuration(format!(
                "unknown query array format {other:?}, expected brackets, comma or repeat"
            ))),
        }
    }
}

/// Input schemas declared by a route.
#[derive(Clone, Default)]
pub struct InputSchemas {
    /// Schema for the JSON body.
    pub json_body: Option<SchemaRef>,
    /// Schema for the query parameters.
    pub query_params: Option<SchemaRef>,
    /// Schema for the query merged with the body.
    pub common_params: Option<SchemaRef>,
    /// Schema for the route parameters.
    pub route_params: Option<SchemaRef>,
    /// Schema for a URL-encoded form body.
    pub url_encoded_form_data: Option<SchemaRef>,
    /// Schema for the JSON view of a multipart form body.
    pub multipart_form_data: Option<SchemaRef>,
}

impl InputSchemas {
    /// Returns `true` if no input is validated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.json_body.is_none()
            && self.query_params.is_none()
            && self.common_params.is_none()
            && self.route_params.is_none()
            && self.url_encoded_form_data.is_none()
            && self.multipart_form_data.is_none()
    }
}

impl fmt::Debug for InputSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchemas")
            .field("json_body", &self.json_body.is_some())
            .field("query_params", &self.query_params.is_some())
            .field("common_params", &self.common_params.is_some())
            .field("route_params", &self.route_params.is_some())
            .field("url_encoded_form_data", &self.url_encoded_form_data.is_some())
            .field("multipart_form_data", &self.multipart_form_data.is_some())
            .finish()
    }
}

/// Parses and validates request input before the handler runs.
#[derive(Debug, Clone)]
pub struct InputValidation {
    schemas: InputSchemas,
    formats: Vec<ArrayFormat>,
}

impl InputValidation {
    /// Creates the stage with every query array format enabled.
    #[must_use]
    pub fn new(schemas: InputSchemas) -> Self {
        Self {
            schemas,
            formats: ArrayFormat::ALL.to_vec(),
        }
    }

    /// Restricts the accepted query array formats.
    #[must_use]
    pub fn array_formats(mut self, formats: impl IntoIterator<Item = ArrayFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    async fn validate(&self, request: &mut Request) -> Result<()> {
        let schemas = &self.schemas;

        if let Some(schema) = &schemas.route_params {
            let raw = serde_json::to_value(request.route_params()).map_err(Error::other)?;
            request.input_mut().route_params = Some(check(schema, "route params", raw)?);
        }

        let query = if schemas.query_params.is_some() || schemas.common_params.is_some() {
            let hint = schemas
                .query_params
                .as_deref()
                .or(schemas.common_params.as_deref());
            Some(parse_query(request.query().unwrap_or(""), &self.formats, hint)?)
        } else {
            None
        };
        if let (Some(schema), Some(raw)) = (&schemas.query_params, &query) {
            request.input_mut().query_params = Some(check(schema, "query params", raw.clone())?);
        }

        let carries_body = has_body(request.method());
        let wants_common_body = schemas.common_params.is_some() && carries_body;

        let content_type = request.content_type();
        let body_is_form = is_form(content_type.as_deref());
        let body_is_multipart = is_multipart(content_type.as_deref());

        let json = if schemas.json_body.is_some()
            || (wants_common_body && !body_is_form && !body_is_multipart)
        {
            Some(parse_json_body(request)?)
        } else {
            None
        };
        if let (Some(schema), Some(raw)) = (&schemas.json_body, &json) {
            request.input_mut().json_body = Some(check(schema, "json body", raw.clone())?);
        }

        let form = if schemas.url_encoded_form_data.is_some() || (wants_common_body && body_is_form)
        {
            Some(parse_form_body(request)?)
        } else {
            None
        };
        if let (Some(schema), Some(raw)) = (&schemas.url_encoded_form_data, &form) {
            request.input_mut().url_encoded_form_data =
                Some(check(schema, "url-encoded form data", raw.clone())?);
        }

        let multipart = if schemas.multipart_form_data.is_some()
            || (wants_common_body && body_is_multipart)
        {
            let (view, parts) = parse_multipart_body(request).await?;
            request.input_mut().multipart_parts = parts;
            Some(view)
        } else {
            None
        };
        if let (Some(schema), Some(raw)) = (&schemas.multipart_form_data, &multipart) {
            request.input_mut().multipart_form_data =
                Some(check(schema, "multipart form data", raw.clone())?);
        }

        if let Some(schema) = &schemas.common_params {
            let mut merged = match query {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            if let Some(Value::Object(body)) = json.or(form).or(multipart) {
                merged.extend(body);
            }
            request.input_mut().common_params =
                Some(check(schema, "common params", Value::Object(merged))?);
        }

        Ok(())
    }
}

impl Middleware for InputValidation {
    fn name(&self) -> &'static str {
        "input_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Reply>> {
        Box::pin(async move {
            let mut request = request;
            if !self.schemas.is_empty() {
                self.validate(&mut request).await?;
                debug!(request_id = %ctx.request_id(), path = request.path(), "input validated");
            }
            next.run(ctx, request).await
        })
    }
}

fn check(schema: &SchemaRef, input: &'static str, raw: Value) -> Result<Value> {
    schema
        .parse(raw)
        .map_err(|issues| Error::input_validation(input, issues))
}

fn has_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::DELETE)
}

fn parse_mime(content_type: Option<&str>) -> Option<mime::Mime> {
    content_type.and_then(|ct| ct.parse().ok())
}

fn is_json(content_type: Option<&str>) -> bool {
    parse_mime(content_type).is_some_and(|m| {
        m.type_() == mime::APPLICATION
            && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
    })
}

fn is_form(content_type: Option<&str>) -> bool {
    parse_mime(content_type).is_some_and(|m| {
        m.type_() == mime::APPLICATION && m.subtype() == mime::WWW_FORM_URLENCODED
    })
}

fn is_multipart(content_type: Option<&str>) -> bool {
    parse_mime(content_type)
        .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
}

/// Parses a query string into a JSON object.
///
/// `schema` supplies the array-field hint for comma splitting.
pub fn parse_query(
    query: &str,
    formats: &[ArrayFormat],
    schema: Option<&dyn Schema>,
) -> Result<Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| Error::invalid_query_params(format!("malformed query string: {e}")))?;

    let mut fields: IndexMap<String, (Vec<String>, bool)> = IndexMap::new();
    for (key, value) in pairs {
        match key.strip_suffix("[]") {
            Some(base) => {
                if !formats.contains(&ArrayFormat::Brackets) {
                    return Err(Error::invalid_query_params(format!(
                        "bracket array syntax is not supported (got {key})"
                    )));
                }
                let entry = fields.entry(base.to_string()).or_default();
                entry.0.push(value);
                entry.1 = true;
            }
            None => {
                let entry = fields.entry(key).or_default();
                if !entry.0.is_empty() && !entry.1 && !formats.contains(&ArrayFormat::Repeat) {
                    return Err(Error::invalid_query_params(
                        "repeated query parameters are not supported",
                    ));
                }
                entry.0.push(value);
            }
        }
    }

    let comma = formats.contains(&ArrayFormat::Comma);
    let object = fields
        .into_iter()
        .map(|(key, (mut values, bracketed))| {
            let is_array = schema.is_some_and(|s| s.is_array_field(&key));
            let value = if bracketed || values.len() > 1 {
                Value::from(values)
            } else if is_array {
                let single = values.pop().unwrap_or_default();
                if comma {
                    Value::from(split_comma(&single))
                } else {
                    Value::from(vec![single])
                }
            } else {
                Value::from(values.pop().unwrap_or_default())
            };
            (key, value)
        })
        .collect();
    Ok(Value::Object(object))
}

fn split_comma(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(ToString::to_string).collect()
}

fn parse_json_body(request: &Request) -> Result<Value> {
    if request.body().is_empty() {
        return Ok(Value::Null);
    }
    let content_type = request.content_type();
    if content_type.is_some() && !is_json(content_type.as_deref()) {
        return Err(Error::invalid_content_type(format!(
            "expected an application/json body, got {}",
            content_type.unwrap_or_default()
        )));
    }
    serde_json::from_slice(request.body())
        .map_err(|e| Error::input_parsing(format!("invalid JSON body: {e}")))
}

fn parse_form_body(request: &Request) -> Result<Value> {
    if !is_form(request.content_type().as_deref()) {
        return Err(Error::invalid_content_type(
            "expected an application/x-www-form-urlencoded body",
        ));
    }
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(request.body())
        .map_err(|e| Error::input_parsing(format!("invalid form body: {e}")))?;

    let mut object = Map::new();
    for (key, value) in pairs {
        match object.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                object.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(object))
}

async fn parse_multipart_body(
    request: &Request,
) -> Result<(Value, IndexMap<String, MultipartValue>)> {
    let header = request
        .header(http::header::CONTENT_TYPE.as_str())
        .unwrap_or_default();
    if !is_multipart(Some(header)) {
        return Err(Error::invalid_content_type(
            "expected a multipart/form-data body",
        ));
    }
    let boundary = multer::parse_boundary(header)
        .map_err(|e| Error::input_parsing(format!("invalid multipart boundary: {e}")))?;

    let body = request.body().clone();
    let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = IndexMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::input_parsing(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::input_parsing(format!("invalid multipart field {name}: {e}")))?;

        let value = if file_name.is_some() {
            MultipartValue::File {
                file_name,
                content_type,
                data,
            }
        } else {
            let text = String::from_utf8(data.to_vec()).map_err(|_| {
                Error::input_parsing(format!("multipart field {name} is not valid UTF-8"))
            })?;
            MultipartValue::Text(text)
        };
        parts.insert(name, value);
    }

    let view = parts
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect::<Map<_, _>>();
    Ok((Value::Object(view), parts))
}
