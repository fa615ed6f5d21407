#![forbid(unsafe_code)]

//! Identities used to address graph entities across engine calls.
//!
//! Every identity is an owned string newtype. Commands store these so a
//! later undo or redo can re-issue the exact same engine call.
//!
//! Paths follow a `node.leaf` convention: [`ParamPath`] and [`PlugPath`]
//! name a parameter or plug on a node. An empty [`PlugPath`] means "no plug"
//! and is how a feed is disconnected.

use std::fmt;

macro_rules! string_ident {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Create the identity from a raw string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Consume the identity, returning the raw string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_ident!(
    /// Name of a node in the engine graph.
    NodeName
);

string_ident!(
    /// Path to a node parameter (`node.param`).
    ParamPath
);

string_ident!(
    /// Path to a node plug (`node.plug`). Empty means "no plug".
    PlugPath
);

string_ident!(
    /// Path to an entity that carries metadata: a node name or the root `/`.
    EntityPath
);

string_ident!(
    /// Key of a typed metadata entry.
    MetaKey
);

fn split_owner(raw: &str) -> Option<(&str, &str)> {
    let (owner, leaf) = raw.split_once('.')?;
    if owner.is_empty() || leaf.is_empty() {
        return None;
    }
    Some((owner, leaf))
}

impl ParamPath {
    /// Build `node.param`.
    #[must_use]
    pub fn on(node: &NodeName, param: &str) -> Self {
        Self(format!("{node}.{param}"))
    }

    /// Node that owns the parameter.
    #[must_use]
    pub fn owner(&self) -> Option<NodeName> {
        split_owner(&self.0).map(|(owner, _)| NodeName::new(owner))
    }

    /// Parameter name without the owning node.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        split_owner(&self.0).map(|(_, leaf)| leaf)
    }
}

impl PlugPath {
    /// The empty plug, used as the output of a disconnected feed.
    #[must_use]
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Build `node.plug`.
    #[must_use]
    pub fn on(node: &NodeName, plug: &str) -> Self {
        Self(format!("{node}.{plug}"))
    }

    /// Node that owns the plug.
    #[must_use]
    pub fn owner(&self) -> Option<NodeName> {
        split_owner(&self.0).map(|(owner, _)| NodeName::new(owner))
    }

    /// Plug name without the owning node.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        split_owner(&self.0).map(|(_, leaf)| leaf)
    }
}

impl EntityPath {
    /// The document root, which carries document-level metadata such as
    /// frame bounds.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl From<&NodeName> for EntityPath {
    fn from(node: &NodeName) -> Self {
        Self(node.as_str().to_string())
    }
}

impl From<NodeName> for EntityPath {
    fn from(node: NodeName) -> Self {
        Self(node.into_inner())
    }
}

impl MetaKey {
    /// Selection flag (`Bool`).
    #[must_use]
    pub fn selected() -> Self {
        Self("selected".to_string())
    }

    /// Node position in the graph view (`Vec2`).
    #[must_use]
    pub fn position() -> Self {
        Self("position".to_string())
    }

    /// Document frame range on the root entity (`Vec2` of start/end).
    #[must_use]
    pub fn frame_bounds() -> Self {
        Self("frame_bounds".to_string())
    }

    /// Whether this key is the selection flag.
    #[must_use]
    pub fn is_selection(&self) -> bool {
        self.0 == "selected"
    }
}
