use crate::error::RouteError;
use std::fmt;

/// A single segment of a routing pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// A literal segment, ex: `users`.
  Static(String),
  /// A named parameter, ex: `:id`. Matches one non-empty path segment.
  Param(String),
  /// A trailing `*`. Matches the rest of the path, slashes included.
  Wildcard,
}

/// A parsed routing pattern.
///
/// ```text
///  Syntax    Type
///  :name     named parameter
///  *         wildcard, last segment only
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
  // The unmodified template.
  template: String,
  segments: Vec<Segment>,
}

impl Pattern {
  /// Parses and validates a routing pattern.
  pub fn parse(template: &str) -> Result<Self, RouteError> {
    let rest = template
      .strip_prefix('/')
      .ok_or_else(|| RouteError::MissingLeadingSlash(template.to_owned()))?;

    let mut segments = Vec::new();
    if !rest.is_empty() {
      let parts: Vec<&str> = rest.split('/').collect();
      let last = parts.len() - 1;

      for (i, part) in parts.into_iter().enumerate() {
        if part == "*" {
          if i != last {
            return Err(RouteError::InvalidWildcard(template.to_owned()));
          }
          segments.push(Segment::Wildcard);
        } else if let Some(name) = part.strip_prefix(':') {
          if name.is_empty() {
            return Err(RouteError::UnnamedParam(template.to_owned()));
          }
          if segments.contains(&Segment::Param(name.to_owned())) {
            return Err(RouteError::DuplicateParam {
              pattern: template.to_owned(),
              key: name.to_owned(),
            });
          }
          segments.push(Segment::Param(name.to_owned()));
        } else {
          segments.push(Segment::Static(part.to_owned()));
        }
      }
    }

    Ok(Pattern {
      template: template.to_owned(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.template
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  /// The parameter keys captured by this pattern, in declaration order.
  /// A wildcard is captured under the key `*`.
  pub fn param_keys(&self) -> Vec<String> {
    self
      .segments
      .iter()
      .filter_map(|segment| match segment {
        Segment::Static(_) => None,
        Segment::Param(name) => Some(name.clone()),
        Segment::Wildcard => Some("*".to_owned()),
      })
      .collect()
  }
}

impl fmt::Display for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.template)
  }
}

/// Strips the leading slash of a request path, yielding the segments left to
/// match. `None` means there is nothing left, which is the case for `/`.
pub(crate) fn segments_of(path: &str) -> Option<&str> {
  match path.strip_prefix('/').unwrap_or(path) {
    "" => None,
    rest => Some(rest),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_segments() {
    let p = Pattern::parse("/users/:id/files/*").unwrap();
    assert_eq!(
      p.segments(),
      &[
        Segment::Static("users".into()),
        Segment::Param("id".into()),
        Segment::Static("files".into()),
        Segment::Wildcard,
      ]
    );
    assert_eq!(p.param_keys(), vec!["id", "*"]);
  }

  #[test]
  fn root_has_no_segments() {
    assert!(Pattern::parse("/").unwrap().segments().is_empty());
  }

  #[test]
  fn trailing_slash_is_an_empty_segment() {
    let p = Pattern::parse("/api/").unwrap();
    assert_eq!(p.segments(), &[Segment::Static("api".into()), Segment::Static("".into())]);
  }

  #[test]
  fn rejects_invalid_patterns() {
    assert_eq!(Pattern::parse(""), Err(RouteError::MissingLeadingSlash("".into())));
    assert_eq!(Pattern::parse("users"), Err(RouteError::MissingLeadingSlash("users".into())));
    assert_eq!(Pattern::parse("/files/*/x"), Err(RouteError::InvalidWildcard("/files/*/x".into())));
    assert_eq!(Pattern::parse("/users/:"), Err(RouteError::UnnamedParam("/users/:".into())));
    assert_eq!(
      Pattern::parse("/:id/x/:id"),
      Err(RouteError::DuplicateParam {
        pattern: "/:id/x/:id".into(),
        key: "id".into()
      })
    );
  }
}
