//! In-memory scene tree, plus the handler that builds one from decode events
//! and the walker that turns one back into write calls.

use std::io::Write;

use serde::{Deserialize, Serialize};

use x3db_core::{
    ArrayCodec, Attribute, AttributeValue, DocumentHandler, Name, ParseError, WriteError, Writer,
};

/// One element of a decoded scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub element: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<SceneAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
    /// Character content, concatenated.
    ///
    /// Runs on either side of a child element are joined into one string and
    /// lose their position relative to `children`; [`write_scene`] emits the
    /// text before any child. X3D keeps character content in leaf-like
    /// elements (`Script`, `ShaderPart`, `appinfo`), where this is lossless.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAttribute {
    pub name: String,
    pub value: AttributeValue,
}

impl SceneNode {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push(SceneAttribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text.push_str(&text.into());
        self
    }

    /// First attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Depth-first, parents before children.
    pub fn walk(&self) -> impl Iterator<Item = &SceneNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }
}

/// [`DocumentHandler`] that assembles a [`SceneNode`] tree.
///
/// The tree is only handed out after the whole document was accepted, so a
/// failed parse never exposes a partial scene.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    open: Vec<SceneNode>,
    root: Option<SceneNode>,
    complete: bool,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree, or `None` unless `end_document` was delivered.
    pub fn into_scene(self) -> Option<SceneNode> {
        if self.complete {
            self.root
        } else {
            None
        }
    }
}

impl DocumentHandler for SceneBuilder {
    fn start_element(&mut self, name: Name<'_>, attributes: &[Attribute<'_>]) -> Result<(), ParseError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(ParseError::Rejected(format!(
                "second root element <{}>",
                name.local
            )));
        }
        self.open.push(SceneNode {
            element: name.local.to_owned(),
            attributes: attributes
                .iter()
                .map(|a| SceneAttribute {
                    name: a.name.local.to_owned(),
                    value: a.value.clone(),
                })
                .collect(),
            children: Vec::new(),
            text: String::new(),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        match self.open.last_mut() {
            Some(node) => node.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => return Err(ParseError::Rejected("character data outside the root element".into())),
        }
        Ok(())
    }

    fn end_element(&mut self, _name: Name<'_>) -> Result<(), ParseError> {
        let node = self
            .open
            .pop()
            .ok_or(ParseError::Unbalanced("end element without matching start"))?;
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), ParseError> {
        if self.root.is_none() {
            return Err(ParseError::Rejected("document has no root element".into()));
        }
        self.complete = true;
        Ok(())
    }
}

/// Emit `node` and its subtree: attributes, then text, then children.
///
/// Mixed content comes back with all text ahead of the children; see
/// [`SceneNode::text`].
pub fn write_scene<W: Write, A: ArrayCodec>(
    writer: &mut Writer<W, A>,
    node: &SceneNode,
) -> Result<(), WriteError> {
    let attributes: Vec<(&str, &AttributeValue)> = node
        .attributes
        .iter()
        .map(|a| (a.name.as_str(), &a.value))
        .collect();
    writer.start_element(&node.element, &attributes)?;
    if !node.text.is_empty() {
        writer.characters(&node.text)?;
    }
    for child in &node.children {
        write_scene(writer, child)?;
    }
    writer.end_element()
}
