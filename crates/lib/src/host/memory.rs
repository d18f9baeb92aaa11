//! In-memory JSON document host.
//!
//! Loads a document tree from a JSON file and serves the [`DocumentHost`]
//! contract against it. Every mutation and save is appended to an operation
//! log, so tests (and `--verbose` runs) can see the exact traffic the engine
//! produced. `save_as` writes a JSON render of the document's state at save
//! time, tagged with the requested format.
//!
//! Document file shape:
//!
//! ```text
//! {
//!   "name": "template",
//!   "layers": [
//!     { "kind": "group", "name": "标题", "children": [
//!       { "kind": "layer", "name": "标题1", "x": 40, "y": 32,
//!         "text": { "contents": "主标题", "size": 35, "color": "#1a1a1a", "font": "DingTalk-JinBuTi" } }
//!     ]},
//!     { "kind": "layer", "name": "背景" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Bounds, DocumentHost, HostError, SaveFormat};
use crate::props::Rgb;

fn default_visible() -> bool {
  true
}

fn default_text_size() -> f64 {
  12.0
}

fn default_text_color() -> Rgb {
  Rgb::new(0, 0, 0)
}

/// A document tree as authored in a document file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub name: String,
  #[serde(default)]
  pub layers: Vec<Node>,
}

/// One element of the tree: a group with children, or a leaf layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
  Group {
    name: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    children: Vec<Node>,
  },
  Layer {
    name: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<TextItem>,
  },
}

impl Node {
  pub fn name(&self) -> &str {
    match self {
      Node::Group { name, .. } | Node::Layer { name, .. } => name,
    }
  }

  pub fn is_group(&self) -> bool {
    matches!(self, Node::Group { .. })
  }

  pub fn children(&self) -> &[Node] {
    match self {
      Node::Group { children, .. } => children,
      Node::Layer { .. } => &[],
    }
  }
}

/// Text attributes of a text-bearing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextItem {
  pub contents: String,
  #[serde(default = "default_text_size")]
  pub size: f64,
  #[serde(default = "default_text_color")]
  pub color: Rgb,
  #[serde(default)]
  pub font: String,
}

/// Address of a node: the child-index route from the document root.
///
/// Routes stay valid because the tree's structure never changes during a
/// session; only property values do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeId(Vec<usize>);

impl NodeId {
  fn child(&self, index: usize) -> NodeId {
    let mut route = self.0.clone();
    route.push(index);
    NodeId(route)
  }
}

/// One recorded document operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
  SetVisible { name: String, visible: bool },
  Translate { name: String, dx: f64, dy: f64 },
  Rotate { name: String, degrees: f64 },
  SetTextContents { name: String, contents: String },
  SetTextSize { name: String, size: f64 },
  SetTextColor { name: String, color: Rgb },
  SetTextFont { name: String, font: String },
  SaveAs { path: PathBuf, format: SaveFormat },
}

impl HostOp {
  /// True for operations that change document state (everything but saves).
  pub fn is_mutation(&self) -> bool {
    !matches!(self, HostOp::SaveAs { .. })
  }
}

fn node_in<'a>(pool: &'a [Node], route: &[usize]) -> Option<&'a Node> {
  let (&first, rest) = route.split_first()?;
  let node = pool.get(first)?;
  if rest.is_empty() {
    return Some(node);
  }
  match node {
    Node::Group { children, .. } => node_in(children, rest),
    Node::Layer { .. } => None,
  }
}

fn node_mut_in<'a>(pool: &'a mut [Node], route: &[usize]) -> Option<&'a mut Node> {
  let (&first, rest) = route.split_first()?;
  let node = pool.get_mut(first)?;
  if rest.is_empty() {
    return Some(node);
  }
  match node {
    Node::Group { children, .. } => node_mut_in(children, rest),
    Node::Layer { .. } => None,
  }
}

/// [`DocumentHost`] over an in-memory [`Document`].
#[derive(Debug)]
pub struct MemoryHost {
  document: Document,
  ops: Vec<HostOp>,
}

impl MemoryHost {
  pub fn new(document: Document) -> Self {
    Self {
      document,
      ops: Vec::new(),
    }
  }

  /// Loads a document file from disk.
  pub fn open(path: &Path) -> Result<Self, HostError> {
    let raw = fs::read_to_string(path).map_err(HostError::Read)?;
    Self::from_json(&raw)
  }

  pub fn from_json(raw: &str) -> Result<Self, HostError> {
    let document = serde_json::from_str(raw).map_err(HostError::Parse)?;
    Ok(Self::new(document))
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  /// Every operation performed so far, in order.
  pub fn ops(&self) -> &[HostOp] {
    &self.ops
  }

  /// Drains the operation log, leaving it empty.
  pub fn take_ops(&mut self) -> Vec<HostOp> {
    std::mem::take(&mut self.ops)
  }

  /// Number of logged operations that mutate document state.
  pub fn mutation_count(&self) -> usize {
    self.ops.iter().filter(|op| op.is_mutation()).count()
  }

  /// Fetches a node by name segments, ignoring element kind. Lookup for
  /// inspection, not resolution; the engine goes through [`DocumentHost`].
  pub fn lookup(&self, segments: &[&str]) -> Option<&Node> {
    let mut found: Option<&Node> = None;
    let mut pool: &[Node] = &self.document.layers;
    for name in segments {
      let node = pool.iter().find(|n| n.name() == *name)?;
      pool = node.children();
      found = Some(node);
    }
    found
  }

  fn node(&self, id: &NodeId) -> Result<&Node, HostError> {
    node_in(&self.document.layers, &id.0).ok_or_else(|| HostError::StaleHandle(format!("{id:?}")))
  }

  fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, HostError> {
    node_mut_in(&mut self.document.layers, &id.0).ok_or_else(|| HostError::StaleHandle(format!("{id:?}")))
  }

  fn children_of(&self, id: &NodeId) -> Option<&[Node]> {
    if id.0.is_empty() {
      return Some(&self.document.layers);
    }
    match node_in(&self.document.layers, &id.0)? {
      Node::Group { children, .. } => Some(children),
      Node::Layer { .. } => None,
    }
  }
}

#[derive(Serialize)]
struct ExportRender<'a> {
  format: SaveFormat,
  document: &'a Document,
}

impl DocumentHost for MemoryHost {
  type Handle = NodeId;

  fn root(&self) -> NodeId {
    NodeId(Vec::new())
  }

  fn child_group(&self, parent: &NodeId, name: &str) -> Option<NodeId> {
    let pool = self.children_of(parent)?;
    pool
      .iter()
      .position(|n| n.is_group() && n.name() == name)
      .map(|idx| parent.child(idx))
  }

  fn child_leaf(&self, parent: &NodeId, name: &str) -> Option<NodeId> {
    let pool = self.children_of(parent)?;
    pool
      .iter()
      .position(|n| !n.is_group() && n.name() == name)
      .map(|idx| parent.child(idx))
  }

  fn name(&self, handle: &NodeId) -> String {
    node_in(&self.document.layers, &handle.0)
      .map(|n| n.name().to_string())
      .unwrap_or_else(|| "<stale>".to_string())
  }

  fn visible(&self, handle: &NodeId) -> Result<bool, HostError> {
    match self.node(handle)? {
      Node::Group { visible, .. } | Node::Layer { visible, .. } => Ok(*visible),
    }
  }

  fn set_visible(&mut self, handle: &NodeId, value: bool) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    match node {
      Node::Group { visible, .. } | Node::Layer { visible, .. } => *visible = value,
    }
    self.ops.push(HostOp::SetVisible { name, visible: value });
    Ok(())
  }

  fn bounds(&self, handle: &NodeId) -> Result<Bounds, HostError> {
    match self.node(handle)? {
      Node::Layer { x, y, width, height, .. } => Ok(Bounds {
        left: *x,
        top: *y,
        right: *x + *width,
        bottom: *y + *height,
      }),
      Node::Group { name, .. } => Err(HostError::Unsupported {
        name: name.clone(),
        operation: "bounds",
      }),
    }
  }

  fn translate(&mut self, handle: &NodeId, dx: f64, dy: f64) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { x, y, .. } = node else {
      return Err(HostError::Unsupported {
        name,
        operation: "translate",
      });
    };
    *x += dx;
    *y += dy;
    self.ops.push(HostOp::Translate { name, dx, dy });
    Ok(())
  }

  fn rotate(&mut self, handle: &NodeId, degrees: f64) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { rotation, .. } = node else {
      return Err(HostError::Unsupported {
        name,
        operation: "rotate",
      });
    };
    *rotation += degrees;
    self.ops.push(HostOp::Rotate { name, degrees });
    Ok(())
  }

  fn text_size(&self, handle: &NodeId) -> Result<f64, HostError> {
    match self.node(handle)? {
      Node::Layer { text: Some(text), .. } => Ok(text.size),
      node => Err(HostError::NotText(node.name().to_string())),
    }
  }

  fn text_color(&self, handle: &NodeId) -> Result<Rgb, HostError> {
    match self.node(handle)? {
      Node::Layer { text: Some(text), .. } => Ok(text.color),
      node => Err(HostError::NotText(node.name().to_string())),
    }
  }

  fn set_text_contents(&mut self, handle: &NodeId, contents: &str) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { text: Some(text), .. } = node else {
      return Err(HostError::NotText(name));
    };
    text.contents = contents.to_string();
    self.ops.push(HostOp::SetTextContents {
      name,
      contents: contents.to_string(),
    });
    Ok(())
  }

  fn set_text_size(&mut self, handle: &NodeId, size: f64) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { text: Some(text), .. } = node else {
      return Err(HostError::NotText(name));
    };
    text.size = size;
    self.ops.push(HostOp::SetTextSize { name, size });
    Ok(())
  }

  fn set_text_color(&mut self, handle: &NodeId, color: Rgb) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { text: Some(text), .. } = node else {
      return Err(HostError::NotText(name));
    };
    text.color = color;
    self.ops.push(HostOp::SetTextColor { name, color });
    Ok(())
  }

  fn set_text_font(&mut self, handle: &NodeId, font: &str) -> Result<(), HostError> {
    let node = self.node_mut(handle)?;
    let name = node.name().to_string();
    let Node::Layer { text: Some(text), .. } = node else {
      return Err(HostError::NotText(name));
    };
    text.font = font.to_string();
    self.ops.push(HostOp::SetTextFont {
      name,
      font: font.to_string(),
    });
    Ok(())
  }

  fn save_as(&mut self, path: &Path, format: SaveFormat) -> Result<(), HostError> {
    let render = ExportRender {
      format,
      document: &self.document,
    };
    let json = serde_json::to_string_pretty(&render).map_err(HostError::Serialize)?;
    fs::write(path, json).map_err(|source| HostError::Write {
      path: path.to_path_buf(),
      source,
    })?;
    self.ops.push(HostOp::SaveAs {
      path: path.to_path_buf(),
      format,
    });
    debug!(path = %path.display(), ?format, "saved document render");
    Ok(())
  }
}
