//! Implementation of the `layersync info` command.

use std::path::Path;

use anyhow::{Context, Result};

use layersync_lib::host::memory::{MemoryHost, Node};

/// Print the element tree of a document, one line per element.
pub fn cmd_info(document: &Path) -> Result<()> {
  let host =
    MemoryHost::open(document).with_context(|| format!("Failed to open document: {}", document.display()))?;

  let doc = host.document();
  println!("Document: {}", doc.name);
  println!("Elements:");
  let mut tally = Tally::default();
  for node in &doc.layers {
    print_node(node, 1);
    tally.count(node);
  }
  println!();
  println!(
    "Totals: {} groups, {} layers ({} text)",
    tally.groups, tally.layers, tally.text_layers
  );
  Ok(())
}

#[derive(Default)]
struct Tally {
  groups: usize,
  layers: usize,
  text_layers: usize,
}

impl Tally {
  fn count(&mut self, node: &Node) {
    match node {
      Node::Group { children, .. } => {
        self.groups += 1;
        for child in children {
          self.count(child);
        }
      }
      Node::Layer { text, .. } => {
        self.layers += 1;
        if text.is_some() {
          self.text_layers += 1;
        }
      }
    }
  }
}

fn print_node(node: &Node, depth: usize) {
  let indent = "  ".repeat(depth);
  match node {
    Node::Group {
      name,
      visible,
      children,
    } => {
      println!("{}{}/{}", indent, name, hidden_tag(*visible));
      for child in children {
        print_node(child, depth + 1);
      }
    }
    Node::Layer {
      name,
      visible,
      text: Some(text),
      ..
    } => {
      println!(
        "{}{} [text \"{}\" {}pt]{}",
        indent,
        name,
        text.contents,
        text.size,
        hidden_tag(*visible)
      );
    }
    Node::Layer { name, visible, x, y, .. } => {
      println!("{}{} ({}, {}){}", indent, name, x, y, hidden_tag(*visible));
    }
  }
}

fn hidden_tag(visible: bool) -> &'static str {
  if visible { "" } else { " (hidden)" }
}
