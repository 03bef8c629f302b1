//! Layout dispatch: built-in fixed mappings vs. data-driven custom
//! column specs.

use crate::formats::{BuiltinKind, FormatDefinition};

/// A resolved layout the transform engine can apply.
///
/// Built-in layouts use hardcoded mapping/formula tables; everything else
/// is driven by the definition's column specs.
#[derive(Debug, Clone)]
pub enum Layout {
    /// One of the fixed meter family layouts.
    BuiltIn(BuiltinKind),
    /// A user-defined layout (owned snapshot; workers never touch the
    /// registry).
    Custom(FormatDefinition),
}

impl Layout {
    /// Resolve a format definition to its layout, dispatching built-ins
    /// by reserved name.
    pub fn resolve(definition: &FormatDefinition) -> Self {
        match BuiltinKind::from_name(&definition.name) {
            Some(kind) => Layout::BuiltIn(kind),
            None => Layout::Custom(definition.clone()),
        }
    }

    /// The layout's display name.
    pub fn name(&self) -> &str {
        match self {
            Layout::BuiltIn(kind) => kind.name(),
            Layout::Custom(def) => &def.name,
        }
    }

    /// The built-in identity, if any.
    pub fn builtin(&self) -> Option<BuiltinKind> {
        match self {
            Layout::BuiltIn(kind) => Some(*kind),
            Layout::Custom(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatDefinition;

    #[test]
    fn reserved_names_resolve_to_builtin() {
        let def = BuiltinKind::Den.definition();
        assert!(matches!(Layout::resolve(&def), Layout::BuiltIn(BuiltinKind::Den)));
    }

    #[test]
    fn other_names_resolve_to_custom() {
        let def = FormatDefinition::new(
            "Plant 7",
            FormatDefinition::default_columns("=C{r}*280"),
        );
        let layout = Layout::resolve(&def);
        assert!(matches!(layout, Layout::Custom(_)));
        assert_eq!(layout.name(), "Plant 7");
    }
}
