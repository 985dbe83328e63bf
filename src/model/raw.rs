//! Unevaluated project structure
//!
//! A [`RawProject`] keeps the literal attribute text of a project file so that
//! callers can inspect `Include`/`Remove`/`Condition` strings before any
//! property expansion happens. Element order is preserved.

use crate::core::error::{AffectedResult, ModelError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProject {
  /// Absolute path of the project file
  pub path: PathBuf,
  /// `Sdk` attribute of `<Project>` or the first `<Sdk Name=..>` child
  pub sdk: Option<String>,
  pub elements: Vec<RawElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawElement {
  PropertyGroup(RawPropertyGroup),
  ItemGroup(RawItemGroup),
  Import(RawImport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPropertyGroup {
  pub condition: Option<String>,
  pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
  pub name: String,
  pub value: String,
  pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItemGroup {
  pub condition: Option<String>,
  pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
  /// Element name, e.g. `ProjectReference` or `Compile`
  pub item_type: String,
  /// `Include` attribute; empty for remove-only elements
  pub include: String,
  pub exclude: Option<String>,
  pub remove: Option<String>,
  pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
  pub project: String,
  pub condition: Option<String>,
}

impl RawProject {
  /// Parse project XML. `path` must already be absolute.
  pub fn parse(path: &Path, text: &str) -> AffectedResult<Self> {
    let parse_error = |message: String| ModelError::Parse {
      path: path.to_path_buf(),
      message,
    };

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc = roxmltree::Document::parse(text).map_err(|e| parse_error(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "Project" {
      return Err(parse_error(format!("root element is <{}>, expected <Project>", root.tag_name().name())).into());
    }

    let mut sdk = root.attribute("Sdk").map(str::to_string);
    let mut elements = Vec::new();

    for child in root.children().filter(|n| n.is_element()) {
      match child.tag_name().name() {
        "PropertyGroup" => elements.push(RawElement::PropertyGroup(RawPropertyGroup {
          condition: condition_of(child),
          properties: child
            .children()
            .filter(|n| n.is_element())
            .map(|p| RawProperty {
              name: p.tag_name().name().to_string(),
              value: p.text().unwrap_or_default().trim().to_string(),
              condition: condition_of(p),
            })
            .collect(),
        })),
        "ItemGroup" => elements.push(RawElement::ItemGroup(RawItemGroup {
          condition: condition_of(child),
          items: child
            .children()
            .filter(|n| n.is_element())
            .map(|i| RawItem {
              item_type: i.tag_name().name().to_string(),
              include: i.attribute("Include").unwrap_or_default().to_string(),
              exclude: non_empty_attribute(i, "Exclude"),
              remove: non_empty_attribute(i, "Remove"),
              condition: condition_of(i),
            })
            .collect(),
        })),
        "Import" => {
          // SDK imports (`<Import Sdk=.. />`) resolve inside the SDK, which we never read
          if let Some(project) = child.attribute("Project")
            && child.attribute("Sdk").is_none()
          {
            elements.push(RawElement::Import(RawImport {
              project: project.to_string(),
              condition: condition_of(child),
            }));
          }
        }
        "Sdk" => {
          if sdk.is_none() {
            sdk = child.attribute("Name").map(str::to_string);
          }
        }
        _ => {}
      }
    }

    Ok(Self {
      path: path.to_path_buf(),
      sdk,
      elements,
    })
  }

  /// Directory containing the project file
  pub fn directory(&self) -> &Path {
    self.path.parent().unwrap_or(Path::new(""))
  }

  pub fn is_sdk_style(&self) -> bool {
    self.sdk.is_some()
  }

  /// All item groups in document order
  pub fn item_groups(&self) -> impl Iterator<Item = &RawItemGroup> {
    self.elements.iter().filter_map(|element| match element {
      RawElement::ItemGroup(group) => Some(group),
      _ => None,
    })
  }

  /// Items of one type across all groups, with the condition of their group
  pub fn items_of<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = (&'a RawItemGroup, &'a RawItem)> + 'a {
    self.item_groups().flat_map(move |group| {
      group
        .items
        .iter()
        .filter(move |item| item.item_type.eq_ignore_ascii_case(item_type))
        .map(move |item| (group, item))
    })
  }
}

fn condition_of(node: roxmltree::Node<'_, '_>) -> Option<String> {
  non_empty_attribute(node, "Condition")
}

fn non_empty_attribute(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
  node
    .attribute(name)
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .map(str::to_string)
}
