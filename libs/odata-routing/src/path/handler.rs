//! Conversion between resource-path strings and [`ODataPath`].
//!
//! [`DefaultPathHandler`] understands the subset of the `OData` URI grammar this
//! crate routes on: entity sets, singletons, keys (single and composite),
//! navigation properties, type casts, bound actions and functions, operation
//! imports, `$count` and `$value`. Query options are not part of a path.

use std::borrow::Cow;
use std::sync::Arc;

use crate::edm::{EdmModel, EntityType, NavigationSource, OperationKind};
use crate::error::Error;
use crate::path::{
    KeySegment, KeyValue, NavigationPropertySegment, ODataPath, OperationSegment, PathSegment,
    TypeSegment,
};

/// Parses and renders resource paths.
pub trait PathHandler: Send + Sync {
    /// Parse a service-root-relative path such as `Customers(1)/Orders`.
    ///
    /// # Errors
    /// Returns `Error::InvalidPath` if the path cannot be resolved against `model`.
    fn parse(&self, model: &EdmModel, odata_path: &str) -> Result<ODataPath, Error>;

    /// Render `path` as an escaped, service-root-relative string.
    fn link(&self, path: &ODataPath) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPathHandler;

impl PathHandler for DefaultPathHandler {
    fn parse(&self, model: &EdmModel, odata_path: &str) -> Result<ODataPath, Error> {
        let mut parser = Parser {
            model,
            segments: Vec::new(),
            current: None,
        };
        for raw in odata_path.trim_matches('/').split('/') {
            if raw.is_empty() {
                return Err(invalid(format!("empty segment in '{odata_path}'")));
            }
            let decoded = urlencoding::decode(raw)
                .map_err(|_| invalid(format!("segment '{raw}' is not valid UTF-8")))?;
            parser.push(&decoded)?;
        }
        ODataPath::with_model(model, parser.segments)
    }

    fn link(&self, path: &ODataPath) -> String {
        let mut out = String::new();
        for (i, segment) in path.segments().iter().enumerate() {
            if i > 0 && !matches!(segment, PathSegment::Key(_)) {
                out.push('/');
            }
            escape_segment(&segment.to_string(), &mut out);
        }
        out
    }
}

/// Percent-escape everything outside the RFC 3986 `pchar` set.
fn escape_segment(raw: &str, out: &mut String) {
    let mut buf = [0u8; 4];
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@".contains(c) {
            out.push(c);
        } else {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidPath(msg)
}

/// What the previous segment produced.
#[derive(Clone)]
struct Current {
    entity_type: Arc<EntityType>,
    is_collection: bool,
    navigation_source: Option<Arc<NavigationSource>>,
}

struct Parser<'m> {
    model: &'m EdmModel,
    segments: Vec<PathSegment>,
    /// `None` before the first segment and after segments that yield no entity.
    current: Option<Current>,
}

impl Parser<'_> {
    fn push(&mut self, raw: &str) -> Result<(), Error> {
        let (name, args) = split_args(raw)?;

        if self.segments.is_empty() {
            return self.push_root(name, args);
        }

        match name {
            "$count" | "$value" if args.is_none() => {
                self.segments.push(if name == "$count" {
                    PathSegment::Count
                } else {
                    PathSegment::Value
                });
                self.current = None;
                Ok(())
            }
            _ => {
                let current = self.current.clone().ok_or_else(|| {
                    invalid(format!("segment '{name}' cannot follow a non-entity segment"))
                })?;
                if name.contains('.') {
                    self.push_qualified(&current, name, args)
                } else {
                    self.push_navigation(&current, name, args)
                }
            }
        }
    }

    fn push_root(&mut self, name: &str, args: Option<&str>) -> Result<(), Error> {
        let model = self.model;
        if let Some(set) = model.entity_set(name) {
            self.segments.push(PathSegment::EntitySet(Arc::clone(set)));
            self.current = Some(Current {
                entity_type: Arc::clone(set.entity_type()),
                is_collection: true,
                navigation_source: Some(Arc::clone(set)),
            });
            return self.push_key(args);
        }
        if let Some(singleton) = model.singleton(name) {
            if args.is_some() {
                return Err(invalid(format!("singleton '{name}' cannot be keyed")));
            }
            self.segments.push(PathSegment::Singleton(Arc::clone(singleton)));
            self.current = Some(Current {
                entity_type: Arc::clone(singleton.entity_type()),
                is_collection: false,
                navigation_source: Some(Arc::clone(singleton)),
            });
            return Ok(());
        }
        if let Some(import) = model.operation_import(name) {
            let parameters = parse_parameters(args)?;
            let mut segment =
                OperationSegment::import(&import.name, Arc::clone(&import.operation), parameters);
            let result = import.operation.return_type().and_then(|r| {
                model
                    .entity_type(&r.type_name)
                    .map(|t| (Arc::clone(t), r.is_collection))
            });
            self.current = None;
            if let Some((entity_type, is_collection)) = result {
                let source = import
                    .entity_set
                    .as_deref()
                    .and_then(|s| model.entity_set(s))
                    .cloned();
                segment = segment.with_result(Arc::clone(&entity_type), source.clone());
                self.current = Some(Current {
                    entity_type,
                    is_collection,
                    navigation_source: source,
                });
            }
            self.segments.push(PathSegment::Operation(segment));
            return Ok(());
        }
        Err(invalid(format!("unknown entity set, singleton or operation import '{name}'")))
    }

    fn push_navigation(
        &mut self,
        current: &Current,
        name: &str,
        args: Option<&str>,
    ) -> Result<(), Error> {
        let model = self.model;
        if current.is_collection {
            return Err(invalid(format!(
                "navigation property '{name}' must follow a single entity"
            )));
        }
        let (property, declaring) = model
            .find_navigation_property(&current.entity_type, name)
            .ok_or_else(|| {
                invalid(format!(
                    "'{}' has no navigation property '{name}'",
                    current.entity_type
                ))
            })?;
        let declaring_type = model
            .entity_type(&declaring.full_name())
            .ok_or_else(|| invalid(format!("unknown type '{declaring}'")))?;
        let target_type = model
            .entity_type(&property.target_type)
            .ok_or_else(|| invalid(format!("unknown type '{}'", property.target_type)))?;

        let navigation_source = match current.navigation_source.as_deref() {
            Some(parent) if property.contains_target => Some(Arc::new(NavigationSource::contained(
                parent,
                &property.name,
                Arc::clone(target_type),
            ))),
            Some(parent) => parent
                .binding(&property.name)
                .and_then(|target| model.entity_set(target).or_else(|| model.singleton(target)))
                .cloned(),
            None => None,
        };

        self.segments
            .push(PathSegment::NavigationProperty(NavigationPropertySegment::new(
                property.clone(),
                Arc::clone(declaring_type),
                Arc::clone(target_type),
                navigation_source.clone(),
            )));
        self.current = Some(Current {
            entity_type: Arc::clone(target_type),
            is_collection: property.is_collection,
            navigation_source,
        });
        self.push_key(args)
    }

    fn push_qualified(
        &mut self,
        current: &Current,
        name: &str,
        args: Option<&str>,
    ) -> Result<(), Error> {
        let model = self.model;
        if let Some(target) = model.entity_type(name) {
            if args.is_some() {
                return Err(invalid(format!("type cast '{name}' cannot carry arguments")));
            }
            if !model.is_or_derives_from(target, &current.entity_type) {
                return Err(invalid(format!(
                    "'{name}' does not derive from '{}'",
                    current.entity_type
                )));
            }
            self.segments.push(PathSegment::TypeCast(TypeSegment::new(
                Arc::clone(target),
                Arc::clone(&current.entity_type),
                current.is_collection,
                current.navigation_source.clone(),
            )));
            self.current = Some(Current {
                entity_type: Arc::clone(target),
                ..current.clone()
            });
            return Ok(());
        }

        let candidates: Vec<_> = model
            .bound_operations(name)
            .filter(|op| {
                op.binding().is_some_and(|b| {
                    b.is_collection == current.is_collection
                        && model
                            .entity_type(&b.type_name)
                            .is_some_and(|t| model.is_or_derives_from(&current.entity_type, t))
                })
            })
            .cloned()
            .collect();
        let Some(first) = candidates.first() else {
            return Err(invalid(format!(
                "no operation '{name}' bound to '{}'",
                current.entity_type
            )));
        };
        let is_function = first.kind() == OperationKind::Function;
        if !is_function && args.is_some() {
            return Err(invalid(format!("action '{name}' cannot carry arguments")));
        }

        let result = first.return_type().and_then(|r| {
            model
                .entity_type(&r.type_name)
                .map(|t| (Arc::clone(t), r.is_collection))
        });
        let mut segment = OperationSegment::bound(candidates, parse_parameters(args)?);
        self.current = None;
        if let Some((entity_type, is_collection)) = result {
            // bound results keep the binding source only when the shape is unchanged
            let source = current
                .navigation_source
                .clone()
                .filter(|_| is_collection == current.is_collection);
            segment = segment.with_result(Arc::clone(&entity_type), source.clone());
            self.current = Some(Current {
                entity_type,
                is_collection,
                navigation_source: source,
            });
        }
        self.segments.push(PathSegment::Operation(segment));
        Ok(())
    }

    fn push_key(&mut self, args: Option<&str>) -> Result<(), Error> {
        let Some(args) = args else {
            return Ok(());
        };
        if args.trim().is_empty() {
            return Err(invalid("empty key".to_owned()));
        }
        let Some(current) = self.current.clone() else {
            return Err(invalid("key applied to a non-entity segment".to_owned()));
        };
        let key_names = self.model.key_of(&current.entity_type);
        let keys = parse_key(args, key_names)?;
        self.segments.push(PathSegment::Key(KeySegment::new(
            keys,
            Arc::clone(&current.entity_type),
            current.navigation_source.clone(),
        )));
        self.current = Some(Current {
            is_collection: false,
            ..current
        });
        Ok(())
    }
}

/// Split `Name(args)` into `("Name", Some("args"))`.
fn split_args(raw: &str) -> Result<(&str, Option<&str>), Error> {
    match raw.find('(') {
        Some(open) if raw.ends_with(')') => Ok((&raw[..open], Some(&raw[open + 1..raw.len() - 1]))),
        Some(_) => Err(invalid(format!("unbalanced parentheses in '{raw}'"))),
        None => Ok((raw, None)),
    }
}

/// Split on commas outside single-quoted literals.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (i, b) in args.bytes().enumerate() {
        match b {
            b'\'' => in_string = !in_string,
            b',' if !in_string => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

/// Split `name=value` outside quotes.
fn split_pair(part: &str) -> Option<(&str, &str)> {
    let eq = part.find('=')?;
    let quote = part.find('\'');
    if quote.is_some_and(|q| q < eq) {
        return None;
    }
    Some((part[..eq].trim(), part[eq + 1..].trim()))
}

fn parse_key(args: &str, key_names: &[String]) -> Result<Vec<(String, KeyValue)>, Error> {
    if key_names.is_empty() {
        return Err(invalid("entity type declares no key".to_owned()));
    }
    let parts = split_top_level(args);
    if let ([single], [key_name]) = (parts.as_slice(), key_names) {
        if split_pair(single).is_none() {
            return Ok(vec![(key_name.clone(), KeyValue::parse_literal(single))]);
        }
    }

    let mut keys = Vec::with_capacity(parts.len());
    for part in parts {
        let (name, value) = split_pair(part)
            .ok_or_else(|| invalid(format!("composite key part '{part}' needs a name")))?;
        if !key_names.iter().any(|k| k == name) {
            return Err(invalid(format!("'{name}' is not a key property")));
        }
        keys.push((name.to_owned(), KeyValue::parse_literal(value)));
    }
    if keys.len() != key_names.len() {
        return Err(invalid(format!(
            "expected {} key values, found {}",
            key_names.len(),
            keys.len()
        )));
    }
    Ok(keys)
}

fn parse_parameters(args: Option<&str>) -> Result<Vec<(String, String)>, Error> {
    let Some(args) = args.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(Vec::new());
    };
    split_top_level(args)
        .into_iter()
        .map(|part| {
            split_pair(part)
                .map(|(n, v)| (n.to_owned(), v.to_owned()))
                .ok_or_else(|| invalid(format!("parameter '{part}' needs a name")))
        })
        .collect()
}

/// Escaped rendering of one raw segment; exposed for link builders that
/// assemble paths by hand.
#[must_use]
pub fn escape_path_segment(raw: &str) -> Cow<'_, str> {
    let needs_escape = raw
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@".contains(c)));
    if !needs_escape {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    escape_segment(raw, &mut out);
    Cow::Owned(out)
}
