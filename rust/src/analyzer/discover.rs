use crate::analyzer::render::Body;
use crate::analyzer::util::{leading_whitespace, LineIndex};
use proc_macro2::Span;
use quote::ToTokens;
use std::ops::Range;
use syn::meta::ParseNestedMeta;
use syn::{
    parenthesized, token, Attribute, Block, ImplItem, Item, Lit, Signature, Token, TraitItem,
    Visibility,
};

/// Where a function declaration lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclShape {
    /// `fn` item at module scope.
    Free,
    /// Method or associated function of an `impl` block.
    Method { receiver: String },
    /// Provided method of a `trait`.
    Provided { receiver: String },
}

/// A function declaration with a body, located in its file's text.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub(crate) name: String,
    pub(crate) shape: DeclShape,
    /// Inline modules enclosing the declaration, outermost first.
    pub(crate) module: Vec<String>,
    pub(crate) line_start: usize,
    pub(crate) line_end: usize,
    /// First token of the declaration up to the last non-blank byte before `{`.
    pub(crate) header: Range<usize>,
    /// `{` through `}` inclusive.
    pub(crate) body_range: Range<usize>,
    /// Leading whitespace of the line the declaration starts on.
    pub(crate) indent: String,
    /// Line ending used on the declaration's first line.
    pub(crate) newline: &'static str,
    pub(crate) body: Body,
}

impl FnDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &DeclShape {
        &self.shape
    }

    pub fn module(&self) -> &[String] {
        &self.module
    }

    pub fn receiver(&self) -> Option<&str> {
        match &self.shape {
            DeclShape::Free => None,
            DeclShape::Method { receiver } | DeclShape::Provided { receiver } => Some(receiver),
        }
    }

    /// `module::Receiver::name`, leaving out whatever is absent. Used in diagnostics.
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = self.module.iter().map(String::as_str).collect();
        parts.extend(self.receiver());
        parts.push(&self.name);
        parts.join("::")
    }

    pub fn line_start(&self) -> usize {
        self.line_start
    }

    pub fn line_end(&self) -> usize {
        self.line_end
    }

    pub fn body(&self) -> Body {
        self.body
    }
}

struct DeclParts<'a> {
    shape: DeclShape,
    vis: Option<&'a Visibility>,
    defaultness: Option<Span>,
    sig: &'a Signature,
    block: &'a Block,
}

/// Collects every function declaration with a body that is not nested in
/// another body, in the order written.
///
/// Inline `mod { }` blocks are walked unless they are `#[cfg(test)]`.
/// Bodies are never descended into, so nested functions and closures are not
/// reported.
pub(crate) fn discover(syntax: &syn::File, text: &str, index: &LineIndex) -> Vec<FnDecl> {
    let mut decls = Vec::new();
    let mut module = Vec::new();
    discover_items(&syntax.items, text, index, &mut module, &mut decls);
    decls
}

fn discover_items(
    items: &[Item],
    text: &str,
    index: &LineIndex,
    module: &mut Vec<String>,
    decls: &mut Vec<FnDecl>,
) {
    for item in items {
        match item {
            Item::Fn(f) => decls.extend(locate(
                text,
                index,
                module,
                DeclParts {
                    shape: DeclShape::Free,
                    vis: Some(&f.vis),
                    defaultness: None,
                    sig: &f.sig,
                    block: &f.block,
                },
            )),
            Item::Impl(im) => {
                let receiver = im.self_ty.to_token_stream().to_string();
                for it in &im.items {
                    if let ImplItem::Fn(m) = it {
                        decls.extend(locate(
                            text,
                            index,
                            module,
                            DeclParts {
                                shape: DeclShape::Method {
                                    receiver: receiver.clone(),
                                },
                                vis: Some(&m.vis),
                                defaultness: m.defaultness.map(|d| d.span),
                                sig: &m.sig,
                                block: &m.block,
                            },
                        ));
                    }
                }
            }
            Item::Trait(t) => {
                let receiver = t.ident.to_string();
                for it in &t.items {
                    if let TraitItem::Fn(m) = it {
                        let Some(block) = &m.default else {
                            continue;
                        };
                        decls.extend(locate(
                            text,
                            index,
                            module,
                            DeclParts {
                                shape: DeclShape::Provided {
                                    receiver: receiver.clone(),
                                },
                                vis: None,
                                defaultness: None,
                                sig: &m.sig,
                                block,
                            },
                        ));
                    }
                }
            }
            Item::Mod(m) => {
                let Some((_, content)) = &m.content else {
                    continue;
                };
                if is_test_only(&m.attrs) {
                    continue;
                }
                module.push(m.ident.to_string());
                discover_items(content, text, index, module, decls);
                module.pop();
            }
            _ => {}
        }
    }
}

fn is_test_only(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        let mut test = false;
        if attr.path().is_ident("cfg") {
            let _ = attr.parse_nested_meta(|meta| cfg_requires_test(meta, &mut test));
        }
        test
    })
}

// Matches `cfg(test)` and `cfg(all(.., test, ..))`; other predicates are skipped over.
fn cfg_requires_test(meta: ParseNestedMeta<'_>, test: &mut bool) -> syn::Result<()> {
    if meta.path.is_ident("test") {
        *test = true;
    } else if meta.path.is_ident("all") {
        meta.parse_nested_meta(|inner| cfg_requires_test(inner, test))?;
    } else if meta.input.peek(token::Paren) {
        let _skipped;
        parenthesized!(_skipped in meta.input);
    } else if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Lit>()?;
    }
    Ok(())
}

// First token of the declaration proper; outer attributes are not part of it.
fn leading_span(parts: &DeclParts<'_>) -> Span {
    let vis = match parts.vis {
        Some(Visibility::Public(p)) => Some(p.span),
        Some(Visibility::Restricted(r)) => Some(r.pub_token.span),
        _ => None,
    };
    let sig = parts.sig;
    vis.or(parts.defaultness)
        .or(sig.constness.map(|t| t.span))
        .or(sig.asyncness.map(|t| t.span))
        .or(sig.unsafety.map(|t| t.span))
        .or(sig.abi.as_ref().map(|abi| abi.extern_token.span))
        .unwrap_or(sig.fn_token.span)
}

fn locate(
    text: &str,
    index: &LineIndex,
    module: &[String],
    parts: DeclParts<'_>,
) -> Option<FnDecl> {
    let name = parts.sig.ident.to_string();
    let first = leading_span(&parts).start();
    let open = parts.block.brace_token.span.open().start();
    let close = parts.block.brace_token.span.close().start();

    let offsets = (
        index.offset(text, first),
        index.offset(text, open),
        index.offset(text, close),
    );
    let (start, open_at, close_at) = match offsets {
        (Some(s), Some(o), Some(c)) if s <= o && text[c..].starts_with('}') => (s, o, c),
        _ => {
            tracing::warn!(
                "Skipping `{}`: span {}:{}..{}:{} does not map onto the source text",
                name,
                first.line,
                first.column,
                close.line,
                close.column
            );
            return None;
        }
    };

    let header_end = start + text[start..open_at].trim_end().len();
    let line = index.line(text, first.line).unwrap_or_default();
    let indent = leading_whitespace(line).to_string();
    let newline = if line.ends_with('\r') { "\r\n" } else { "\n" };

    Some(FnDecl {
        name,
        shape: parts.shape,
        module: module.to_vec(),
        line_start: first.line,
        line_end: close.line,
        header: start..header_end,
        body_range: open_at..close_at + 1,
        indent,
        newline,
        body: Body::Original,
    })
}
