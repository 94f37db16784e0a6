//! Procedural macros for statecell

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any, struct_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Prepended to every type string, joined with `/`
    #[darling(default)]
    prefix: Option<String>,

    /// Case applied to variant (or struct) names
    #[darling(default)]
    rename_all: Option<String>,

    /// Exact type string for a struct action
    #[darling(default)]
    name: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Exact type string, bypassing `prefix` and `rename_all`
    #[darling(default)]
    rename: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum RenameRule {
    Unchanged,
    Snake,
    ScreamingSnake,
    Kebab,
    Camel,
}

impl RenameRule {
    fn parse(rule: Option<&str>) -> Result<Self, String> {
        match rule {
            None => Ok(RenameRule::Unchanged),
            Some("snake_case") => Ok(RenameRule::Snake),
            Some("SCREAMING_SNAKE_CASE") => Ok(RenameRule::ScreamingSnake),
            Some("kebab-case") => Ok(RenameRule::Kebab),
            Some("camelCase") => Ok(RenameRule::Camel),
            Some(other) => Err(format!(
                "unknown rename_all rule `{other}`; expected one of \
                 snake_case, SCREAMING_SNAKE_CASE, kebab-case, camelCase"
            )),
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Unchanged => name.to_string(),
            RenameRule::Snake => split_pascal_case(name).join("_").to_lowercase(),
            RenameRule::ScreamingSnake => split_pascal_case(name).join("_").to_uppercase(),
            RenameRule::Kebab => split_pascal_case(name).join("-").to_lowercase(),
            RenameRule::Camel => {
                let mut chars = name.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                }
            }
        }
    }
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn with_prefix(prefix: Option<&str>, name: String) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{name}"),
        _ => name,
    }
}

/// Derive macro for the Action trait
///
/// Generates `name()` returning the action's type string, derived from the
/// variant name (or the struct name), plus an inherent `action_types()`
/// listing every type string the enum can produce.
///
/// Container attributes:
/// - `prefix = "todos"`: type strings become `todos/<name>`
/// - `rename_all = "snake_case"`: also `SCREAMING_SNAKE_CASE`, `kebab-case`, `camelCase`
/// - `name = "..."`: exact type string (structs only)
///
/// Variant attributes:
/// - `rename = "..."`: exact type string for that variant
///
/// Pair it with `#[derive(Serialize)]` and `#[serde(tag = "type")]` so
/// struct variants serialize as flat records.
///
/// # Example
/// ```ignore
/// #[derive(Action, Serialize)]
/// #[serde(tag = "type")]
/// #[action(prefix = "todos", rename_all = "snake_case")]
/// enum TodoAction {
///     AddTodo { text: String },
///     ToggleTodo { index: usize },
///     #[action(rename = "todos/reset")]
///     ClearAll,
/// }
///
/// assert_eq!(TodoAction::AddTodo { text: "x".into() }.name(), "todos/add_todo");
/// assert_eq!(TodoAction::ClearAll.name(), "todos/reset");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(expand_action(&input))
}

fn expand_action(input: &DeriveInput) -> TokenStream2 {
    let opts = match ActionOpts::from_derive_input(input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors(),
    };

    let rule = match RenameRule::parse(opts.rename_all.as_deref()) {
        Ok(rule) => rule,
        Err(message) => return syn::Error::new_spanned(input, message).to_compile_error(),
    };

    let name = &opts.ident;
    let prefix = opts.prefix.as_deref();
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    match &opts.data {
        darling::ast::Data::Enum(variants) => {
            if opts.name.is_some() {
                return syn::Error::new_spanned(
                    input,
                    "`name` applies to struct actions; use `rename` on variants instead",
                )
                .to_compile_error();
            }

            let type_strings: Vec<String> = variants
                .iter()
                .map(|v| match &v.rename {
                    Some(rename) => rename.clone(),
                    None => with_prefix(prefix, rule.apply(&v.ident.to_string())),
                })
                .collect();

            let name_arms: Vec<TokenStream2> = variants
                .iter()
                .zip(&type_strings)
                .map(|(v, type_str)| {
                    let variant_name = &v.ident;
                    match &v.fields.style {
                        darling::ast::Style::Unit => quote! {
                            #name::#variant_name => #type_str
                        },
                        darling::ast::Style::Tuple => quote! {
                            #name::#variant_name(..) => #type_str
                        },
                        darling::ast::Style::Struct => quote! {
                            #name::#variant_name { .. } => #type_str
                        },
                    }
                })
                .collect();

            let body = if variants.is_empty() {
                quote! { match *self {} }
            } else {
                quote! {
                    match self {
                        #(#name_arms),*
                    }
                }
            };

            quote! {
                impl #impl_generics ::statecell::Action for #name #ty_generics #where_clause {
                    fn name(&self) -> &'static str {
                        #body
                    }
                }

                impl #impl_generics #name #ty_generics #where_clause {
                    /// Every action type string this enum produces, in declaration order
                    pub fn action_types() -> &'static [&'static str] {
                        &[#(#type_strings),*]
                    }
                }
            }
        }
        darling::ast::Data::Struct(_) => {
            let type_str = match &opts.name {
                Some(exact) => exact.clone(),
                None => with_prefix(prefix, rule.apply(&name.to_string())),
            };
            quote! {
                impl #impl_generics ::statecell::Action for #name #ty_generics #where_clause {
                    fn name(&self) -> &'static str {
                        #type_str
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pascal_case() {
        assert_eq!(split_pascal_case("AddTodo"), vec!["Add", "Todo"]);
        assert_eq!(split_pascal_case("Tick"), vec!["Tick"]);
        assert!(split_pascal_case("").is_empty());
    }

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Snake.apply("ToggleTodo"), "toggle_todo");
        assert_eq!(RenameRule::ScreamingSnake.apply("ToggleTodo"), "TOGGLE_TODO");
        assert_eq!(RenameRule::Kebab.apply("ToggleTodo"), "toggle-todo");
        assert_eq!(RenameRule::Camel.apply("ToggleTodo"), "toggleTodo");
        assert_eq!(RenameRule::Unchanged.apply("ToggleTodo"), "ToggleTodo");
    }

    #[test]
    fn test_parse_rename_rule() {
        assert!(matches!(RenameRule::parse(None), Ok(RenameRule::Unchanged)));
        assert!(matches!(
            RenameRule::parse(Some("kebab-case")),
            Ok(RenameRule::Kebab)
        ));
        assert!(RenameRule::parse(Some("Title Case")).is_err());
    }

    fn expand_str(input: DeriveInput) -> String {
        expand_action(&input).to_string()
    }

    #[test]
    fn test_expands_enum_type_strings() {
        let output = expand_str(syn::parse_quote! {
            #[action(prefix = "todos", rename_all = "snake_case")]
            enum TodoAction {
                AddTodo { text: String },
                Clear,
            }
        });
        assert!(output.contains("\"todos/add_todo\""));
        assert!(output.contains("\"todos/clear\""));
        assert!(output.contains("action_types"));
    }

    #[test]
    fn test_unknown_rename_rule_is_compile_error() {
        let output = expand_str(syn::parse_quote! {
            #[action(rename_all = "Title Case")]
            struct Tick;
        });
        assert!(output.contains("compile_error"));
    }

    #[test]
    fn test_name_on_enum_is_compile_error() {
        let output = expand_str(syn::parse_quote! {
            #[action(name = "tick")]
            enum Tick {
                Once,
            }
        });
        assert!(output.contains("compile_error"));
        assert!(!output.contains("impl"));
    }

    #[test]
    fn test_with_prefix() {
        assert_eq!(with_prefix(Some("todos"), "add".into()), "todos/add");
        assert_eq!(with_prefix(Some(""), "add".into()), "add");
        assert_eq!(with_prefix(None, "add".into()), "add");
    }
}
