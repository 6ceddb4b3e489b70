//! Rendering of declarations and whole files under a temporary body swap.
//!
//! Every byte outside a swapped body slot is copied from the original text, so
//! declarations that are not the render target come out unchanged.

use crate::analyzer::error::RenderError;
use crate::analyzer::source::SourceFile;
use crate::analyzer::util::dedent;
use std::ops::{Deref, Range};

pub const PLACEHOLDER_MESSAGE: &str = "TODO: Implement this function";

/// What a declaration's body renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Body {
    /// The body as written.
    #[default]
    Original,
    /// A block holding only the placeholder `panic!`.
    Placeholder,
    /// Nothing, not even braces.
    Elided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    ElideBody,
    PlaceholderBody,
}

impl RenderMode {
    fn body(self) -> Body {
        match self {
            RenderMode::ElideBody => Body::Elided,
            RenderMode::PlaceholderBody => Body::Placeholder,
        }
    }
}

/// A body slot swapped on a `SourceFile`; the original slot comes back on drop.
pub struct BodySwap<'a> {
    file: &'a mut SourceFile,
    index: usize,
    saved: Body,
}

impl Deref for BodySwap<'_> {
    type Target = SourceFile;

    fn deref(&self) -> &SourceFile {
        self.file
    }
}

impl Drop for BodySwap<'_> {
    fn drop(&mut self) {
        self.file.decls[self.index].body = self.saved;
    }
}

fn indent_unit(indent: &str) -> &'static str {
    if indent.contains('\t') {
        "\t"
    } else {
        "    "
    }
}

fn placeholder_block(indent: &str, unit: &str, newline: &str) -> String {
    format!("{{{newline}{indent}{unit}panic!(\"{PLACEHOLDER_MESSAGE}\"){newline}{indent}}}")
}

impl SourceFile {
    pub fn swap_body(&mut self, index: usize, body: Body) -> Result<BodySwap<'_>, RenderError> {
        let decl = self
            .decls
            .get_mut(index)
            .ok_or(RenderError::UnknownDecl(index))?;
        let saved = std::mem::replace(&mut decl.body, body);
        Ok(BodySwap {
            file: self,
            index,
            saved,
        })
    }

    /// Runs `render` with declaration `index` holding `body`, restoring the
    /// previous body afterwards whatever `render` returns.
    pub fn render_with<T>(
        &mut self,
        index: usize,
        body: Body,
        render: impl FnOnce(&SourceFile) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let swapped = self.swap_body(index, body)?;
        let rendered = render(&*swapped);
        drop(swapped);
        rendered
    }

    pub fn render_decl_as(&mut self, index: usize, mode: RenderMode) -> Result<String, RenderError> {
        self.render_with(index, mode.body(), |file| file.render_decl(index))
    }

    /// Declaration header with no body: `pub fn get(&self, p: &str) -> String`.
    pub fn signature(&mut self, index: usize) -> Result<String, RenderError> {
        self.render_decl_as(index, RenderMode::ElideBody)
    }

    pub fn placeholder_decl(&mut self, index: usize) -> Result<String, RenderError> {
        self.render_decl_as(index, RenderMode::PlaceholderBody)
    }

    /// The whole file with only declaration `index` holding the placeholder.
    pub fn placeholder_file(&mut self, index: usize) -> Result<String, RenderError> {
        self.render_with(index, Body::Placeholder, |file| file.render_file())
    }

    fn slice(&self, range: Range<usize>) -> Result<&str, RenderError> {
        self.text
            .get(range.clone())
            .ok_or(RenderError::OutOfBounds {
                start: range.start,
                end: range.end,
            })
    }

    /// Renders one declaration on its own, dedented to column zero.
    pub fn render_decl(&self, index: usize) -> Result<String, RenderError> {
        let decl = self.decl(index).ok_or(RenderError::UnknownDecl(index))?;
        let mut out = dedent(self.slice(decl.header.clone())?, &decl.indent);
        let body = match decl.body {
            Body::Elided => return Ok(out),
            Body::Original => dedent(self.slice(decl.body_range.clone())?, &decl.indent),
            Body::Placeholder => placeholder_block("", indent_unit(&decl.indent), decl.newline),
        };
        let gap = self.slice(decl.header.end..decl.body_range.start)?;
        out.push_str(if gap.contains('\n') { decl.newline } else { " " });
        out.push_str(&body);
        Ok(out)
    }

    /// Renders the whole file with every declaration's current body.
    pub fn render_file(&self) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for decl in self.decls.iter().filter(|d| d.body != Body::Original) {
            if decl.body_range.start < cursor {
                return Err(RenderError::Overlap {
                    name: decl.qualified_name(),
                });
            }
            out.push_str(self.slice(cursor..decl.body_range.start)?);
            match decl.body {
                Body::Placeholder => out.push_str(&placeholder_block(
                    &decl.indent,
                    indent_unit(&decl.indent),
                    decl.newline,
                )),
                Body::Elided => {
                    return Err(RenderError::ElidedInFile {
                        name: decl.qualified_name(),
                    })
                }
                Body::Original => {}
            }
            cursor = decl.body_range.end;
        }
        out.push_str(self.slice(cursor..self.text.len())?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CLIENT: &str = r#"use std::io;

pub struct Client {
    host: String,
}

impl Client {
    /// Issue a GET request.
    pub fn get(&self, p: &str) -> Result<String, io::Error> {
        let url = format!("{}/{}", self.host, p);
        Ok(url)
    }

    fn bounded<T>(&self, value: T) -> T
    where
        T: Clone,
    {
        value.clone()
    }
}

fn helper() -> u8 {
    7
}
"#;

    fn client() -> SourceFile {
        SourceFile::parse("api/client.rs", CLIENT.to_string()).unwrap()
    }

    fn bodies(file: &SourceFile) -> Vec<Body> {
        file.decls().iter().map(|d| d.body()).collect()
    }

    #[test]
    fn signature_omits_body_and_braces() {
        let mut file = client();
        assert_eq!(
            file.signature(0).unwrap(),
            "pub fn get(&self, p: &str) -> Result<String, io::Error>"
        );
        assert_eq!(
            file.signature(1).unwrap(),
            "fn bounded<T>(&self, value: T) -> T\nwhere\n    T: Clone,"
        );
    }

    #[test]
    fn placeholder_decl_keeps_signature_verbatim() {
        let mut file = client();
        assert_eq!(
            file.placeholder_decl(0).unwrap(),
            "pub fn get(&self, p: &str) -> Result<String, io::Error> {\n    panic!(\"TODO: Implement this function\")\n}"
        );
        assert_eq!(
            file.placeholder_decl(1).unwrap(),
            "fn bounded<T>(&self, value: T) -> T\nwhere\n    T: Clone,\n{\n    panic!(\"TODO: Implement this function\")\n}"
        );
        assert_eq!(
            file.placeholder_decl(2).unwrap(),
            "fn helper() -> u8 {\n    panic!(\"TODO: Implement this function\")\n}"
        );
    }

    #[test]
    fn placeholder_file_touches_only_the_target_body() {
        let mut file = client();
        let rendered = file.placeholder_file(0).unwrap();
        let expected = CLIENT.replace(
            "{\n        let url = format!(\"{}/{}\", self.host, p);\n        Ok(url)\n    }",
            "{\n        panic!(\"TODO: Implement this function\")\n    }",
        );
        assert_eq!(rendered, expected);
        assert_eq!(rendered.matches(PLACEHOLDER_MESSAGE).count(), 1);
        syn::parse_file(&rendered).unwrap();
    }

    #[test]
    fn renders_leave_the_shared_file_untouched() {
        let mut file = client();
        for index in 0..file.decls().len() {
            file.signature(index).unwrap();
            file.placeholder_decl(index).unwrap();
            file.placeholder_file(index).unwrap();
            assert_eq!(bodies(&file), vec![Body::Original; 3]);
        }
        assert_eq!(file.render_file().unwrap(), CLIENT);
        // order of the three renders does not matter
        let late = file.placeholder_file(2).unwrap();
        let sig = file.signature(2).unwrap();
        assert_eq!(late, client().placeholder_file(2).unwrap());
        assert_eq!(sig, "fn helper() -> u8");
    }

    #[test]
    fn failed_render_still_restores_body() {
        let mut file = client();
        let err = file
            .render_with(1, Body::Elided, |f| f.render_file())
            .unwrap_err();
        assert!(matches!(err, RenderError::ElidedInFile { ref name } if name == "Client::bounded"));
        assert_eq!(bodies(&file), vec![Body::Original; 3]);
    }

    #[test]
    fn guard_restores_on_drop() {
        let mut file = client();
        {
            let swapped = file.swap_body(2, Body::Placeholder).unwrap();
            assert_eq!(swapped.decl(2).unwrap().body(), Body::Placeholder);
            assert!(swapped.render_file().unwrap().ends_with(
                "fn helper() -> u8 {\n    panic!(\"TODO: Implement this function\")\n}\n"
            ));
        }
        assert_eq!(file.decl(2).unwrap().body(), Body::Original);
    }

    #[test]
    fn unknown_index_is_an_error() {
        let mut file = client();
        assert!(matches!(
            file.signature(9),
            Err(RenderError::UnknownDecl(9))
        ));
    }

    #[test]
    fn original_body_renders_dedented() {
        let file = client();
        assert_eq!(
            file.render_decl(0).unwrap(),
            "pub fn get(&self, p: &str) -> Result<String, io::Error> {\n    let url = format!(\"{}/{}\", self.host, p);\n    Ok(url)\n}"
        );
    }

    #[test]
    fn crlf_files_keep_crlf_in_the_placeholder() {
        let src = "impl A {\r\n    fn one(&self) -> u8 {\r\n        1\r\n    }\r\n}\r\n";
        let mut file = SourceFile::parse("a.rs", src.to_string()).unwrap();
        let rendered = file.placeholder_file(0).unwrap();
        assert_eq!(
            rendered,
            "impl A {\r\n    fn one(&self) -> u8 {\r\n        panic!(\"TODO: Implement this function\")\r\n    }\r\n}\r\n"
        );
        assert_eq!(rendered.matches('\n').count(), rendered.matches("\r\n").count());
        assert_eq!(
            file.placeholder_decl(0).unwrap(),
            "fn one(&self) -> u8 {\r\n    panic!(\"TODO: Implement this function\")\r\n}"
        );
    }

    #[test]
    fn tab_indented_methods_get_tab_placeholders() {
        let src = "impl A {\n\tfn one(&self) {\n\t\tprintln!(\"one\");\n\t}\n}\n";
        let mut file = SourceFile::parse("a.rs", src.to_string()).unwrap();
        assert_eq!(
            file.placeholder_file(0).unwrap(),
            "impl A {\n\tfn one(&self) {\n\t\tpanic!(\"TODO: Implement this function\")\n\t}\n}\n"
        );
        assert_eq!(
            file.placeholder_decl(0).unwrap(),
            "fn one(&self) {\n\tpanic!(\"TODO: Implement this function\")\n}"
        );
    }
}
