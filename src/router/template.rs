//! Path templates: literal segments and `{name}` parameters.

use std::collections::HashMap;
use std::fmt;

use crate::router::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/test/{param}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template. Parameter names must be unique within it.
    pub fn parse(template: &str) -> Result<Self, Error> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| Error::MissingLeadingSlash(template.to_string()))?;

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            let parsed = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some("") => return Err(Error::EmptyParameter(template.to_string())),
                Some(name) if !name.contains(['{', '}']) => {
                    if segments.contains(&Segment::Param(name.to_string())) {
                        return Err(Error::DuplicateParameter {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Segment::Param(name.to_string())
                }
                _ if segment.contains(['{', '}']) => {
                    return Err(Error::InvalidSegment {
                        template: template.to_string(),
                        segment: segment.to_string(),
                    })
                }
                _ => Segment::Literal(segment.to_string()),
            };
            segments.push(parsed);
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters, in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete path (without query string) and bind parameters.
    ///
    /// A parameter binds exactly one non-empty segment.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = HashMap::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
