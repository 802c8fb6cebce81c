//! Destructuring patterns.
//!
//! Desugaring contract: a temporary binds the initializer; identifier
//! patterns bind via indexed/named access with nullish-coalesced defaults;
//! nested patterns recurse; an array rest takes the tail from its positional
//! index; an object rest excludes all previously-named keys.

use crate::expr::Expr;

/// A binding pattern on the left of a declaration, parameter, or assignment.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// `x` or `x = default`
    Identifier {
        name: String,
        default: Option<Box<Expr>>,
    },
    /// `...rest`
    Rest { name: String },
    /// `[a, , b = 1, ...tail]`
    Array { elements: Vec<ArrayElement> },
    /// `{a, b: c, d = 1, ...rest}`
    Object {
        properties: Vec<ObjectPatternProperty>,
    },
}

/// One position of an array pattern.
#[derive(Debug, Clone)]
pub enum ArrayElement {
    /// An elision: `[a, , b]`
    Hole,
    Pattern(Pattern),
}

/// One property of an object pattern.
#[derive(Debug, Clone)]
pub enum ObjectPatternProperty {
    /// `{key}` / `{key: pattern}` / `{key: pattern = default}`
    Named {
        key: String,
        value: Pattern,
        default: Option<Box<Expr>>,
    },
    /// `{...rest}`: binds an object excluding all previously-named keys.
    Rest { name: String },
}

impl Pattern {
    /// All identifier names this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Identifier { name, .. } | Pattern::Rest { name } => out.push(name),
            Pattern::Array { elements } => {
                for element in elements {
                    if let ArrayElement::Pattern(p) = element {
                        p.collect_bound_names(out);
                    }
                }
            }
            Pattern::Object { properties } => {
                for property in properties {
                    match property {
                        ObjectPatternProperty::Named { value, .. } => {
                            value.collect_bound_names(out)
                        }
                        ObjectPatternProperty::Rest { name } => out.push(name),
                    }
                }
            }
        }
    }
}
