//! Property application against resolved handles.
//!
//! [`apply`] resolves a path and writes each present property to every
//! resolved handle, primary and shadow alike. A property that fails on one
//! handle is logged and collected; the remaining properties and handles
//! still run. Nothing is retried.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::host::{DocumentHost, HostError};
use crate::path::LayerPath;
use crate::props::{ColorError, PropertySet, Rgb};
use crate::resolve::{ResolveError, Resolver};

/// The property a mutation was setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
  Visible,
  Move,
  Rotate,
  TextContents,
  TextSize,
  TextColor,
  TextFont,
}

impl fmt::Display for Property {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Property::Visible => "visible",
      Property::Move => "move",
      Property::Rotate => "rotate",
      Property::TextContents => "textItem.contents",
      Property::TextSize => "textItem.size",
      Property::TextColor => "textItem.color",
      Property::TextFont => "textItem.font",
    };
    f.write_str(name)
  }
}

/// One failed property write on one element.
#[derive(Debug, Error)]
pub enum MutationError {
  #[error("{property} on '{element}': {source}")]
  Host {
    property: Property,
    element: String,
    #[source]
    source: HostError,
  },

  #[error("{property} on '{element}': {source}")]
  Color {
    property: Property,
    element: String,
    #[source]
    source: ColorError,
  },
}

/// Applies `props` to every handle `path` resolves to.
///
/// Resolution failure is the only hard error; property failures come back in
/// the `Ok` vector.
pub fn apply<D: DocumentHost>(
  host: &mut D,
  resolver: &mut Resolver<D::Handle>,
  path: &LayerPath,
  props: &PropertySet,
) -> Result<Vec<MutationError>, ResolveError> {
  let handles = resolver.resolve(host, path)?;
  Ok(apply_to_handles(host, &handles, props))
}

/// Applies `props` to already-resolved handles, in order.
pub fn apply_to_handles<D: DocumentHost>(
  host: &mut D,
  handles: &[D::Handle],
  props: &PropertySet,
) -> Vec<MutationError> {
  let mut failures = Vec::new();
  for handle in handles {
    apply_to_handle(host, handle, props, &mut failures);
  }
  failures
}

fn apply_to_handle<D: DocumentHost>(
  host: &mut D,
  handle: &D::Handle,
  props: &PropertySet,
  failures: &mut Vec<MutationError>,
) {
  let element = host.name(handle);

  if let Some(visible) = props.visible
    && let Err(source) = host.set_visible(handle, visible)
  {
    failures.push(fail_host(&element, Property::Visible, source));
  }

  if let Some((x, y)) = props.move_to {
    // Absolute target, relative mechanism: delta from the live origin.
    let result = host.bounds(handle).and_then(|bounds| {
      let (x0, y0) = bounds.origin();
      host.translate(handle, x - x0, y - y0)
    });
    if let Err(source) = result {
      failures.push(fail_host(&element, Property::Move, source));
    }
  }

  if let Some(degrees) = props.rotate
    && let Err(source) = host.rotate(handle, degrees)
  {
    failures.push(fail_host(&element, Property::Rotate, source));
  }

  if let Some(text) = &props.text {
    if let Some(contents) = &text.contents
      && let Err(source) = host.set_text_contents(handle, &contents.render())
    {
      failures.push(fail_host(&element, Property::TextContents, source));
    }
    if let Some(size) = text.size
      && let Err(source) = host.set_text_size(handle, size)
    {
      failures.push(fail_host(&element, Property::TextSize, source));
    }
    if let Some(color) = &text.color {
      match Rgb::from_hex(color) {
        Ok(rgb) => {
          if let Err(source) = host.set_text_color(handle, rgb) {
            failures.push(fail_host(&element, Property::TextColor, source));
          }
        }
        Err(source) => failures.push(fail_color(&element, Property::TextColor, source)),
      }
    }
    if let Some(font) = &text.font
      && let Err(source) = host.set_text_font(handle, font)
    {
      failures.push(fail_host(&element, Property::TextFont, source));
    }
  }
}

fn fail_host(element: &str, property: Property, source: HostError) -> MutationError {
  let err = MutationError::Host {
    property,
    element: element.to_string(),
    source,
  };
  warn!(error = %err, "property mutation failed");
  err
}

fn fail_color(element: &str, property: Property, source: ColorError) -> MutationError {
  let err = MutationError::Color {
    property,
    element: element.to_string(),
    source,
  };
  warn!(error = %err, "property mutation failed");
  err
}
