//! Page and legacy view shapes: `ExecuteAsync` bodies that write markup
//! through the page's text writer.

use stencil_types::syntax::is_void_element;
use stencil_types::{IrKind, IrNodeId};

use crate::error::CodegenResult;
use crate::generator::{Generator, Scope};
use crate::names::{self, string_literal};

impl<'a> Generator<'a> {
    pub(crate) fn emit_view_children(&mut self, parent: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        for &child in ir.children(parent) {
            self.emit_view_node(child)?;
        }
        Ok(())
    }

    /// Write any buffered markup as one `WriteLiteral` call.
    pub(crate) fn flush_literal(&mut self) {
        if self.literal.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.literal);
        self.out.ensure_line_start();
        self.out
            .line(&format!("WriteLiteral({});", string_literal(&text)));
    }

    fn emit_view_node(&mut self, id: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        match ir.kind(id) {
            IrKind::HtmlContent { text } => self.literal.push_str(text),
            IrKind::HtmlElement { tag, self_closing }
            | IrKind::Component {
                tag, self_closing, ..
            } => self.emit_view_element(id, tag, *self_closing)?,
            IrKind::CSharpExpression { .. } => {
                self.flush_literal();
                self.emit_write(id)?;
            }
            IrKind::CSharpCode => {
                self.flush_literal();
                self.emit_view_code(id)?;
            }
            IrKind::Template { .. } => {
                self.flush_literal();
                self.out.ensure_line_start();
                self.out.write("Write(");
                self.write_view_template(id)?;
                self.out.write(");").newline();
            }
            _ => {}
        }
        Ok(())
    }

    /// `Write(expr);`, or the design-time sink assignment.
    fn emit_write(&mut self, expression: IrNodeId) -> CodegenResult<()> {
        if self.options.design_time() {
            let prefix = format!("{} = ", names::DESIGN_TIME_SINK);
            self.expression_statement(expression, &prefix, ";", Scope::default())
        } else {
            self.expression_statement(expression, "Write(", ");", Scope::default())
        }
    }

    pub(crate) fn emit_view_code(&mut self, code: IrNodeId) -> CodegenResult<()> {
        self.emit_code_parts(code, Scope::default(), |g, part, _| {
            g.emit_view_node(part)?;
            g.flush_literal();
            Ok(())
        })
    }

    fn emit_view_element(&mut self, id: IrNodeId, tag: &str, self_closing: bool) -> CodegenResult<()> {
        let ir = self.ir;
        self.literal.push('<');
        self.literal.push_str(tag);

        let mut content = Vec::new();
        for &child in ir.children(id) {
            let name = match ir.kind(child) {
                IrKind::HtmlAttribute { name, .. } | IrKind::ComponentAttribute { name, .. } => name,
                _ => {
                    content.push(child);
                    continue;
                }
            };
            let minimized = matches!(ir.kind(child), IrKind::HtmlAttribute { minimized: true, .. });
            self.literal.push(' ');
            // `<input @attributes />` in a view: the expression writes the
            // attribute text itself.
            if name.is_empty() {
                self.write_attribute_parts(child)?;
                continue;
            }
            self.literal.push_str(name);
            if minimized {
                continue;
            }
            self.literal.push_str("=\"");
            self.write_attribute_parts(child)?;
            self.literal.push('"');
        }

        if self_closing {
            self.literal.push_str(" />");
            return Ok(());
        }
        self.literal.push('>');
        for child in content {
            self.emit_view_node(child)?;
        }
        if !is_void_element(tag) {
            self.literal.push_str("</");
            self.literal.push_str(tag);
            self.literal.push('>');
        }
        Ok(())
    }

    fn write_attribute_parts(&mut self, attribute: IrNodeId) -> CodegenResult<()> {
        let ir = self.ir;
        for &part in ir.children(attribute) {
            match ir.kind(part) {
                IrKind::HtmlAttributeValue { text } => {
                    self.literal.push_str(&text.replace('"', "&quot;"));
                }
                IrKind::CSharpExpression { .. } => {
                    self.flush_literal();
                    self.emit_write(part)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// `item => new HelperResult(async(writer) => { ... })`, left open
    /// after the closing parenthesis.
    pub(crate) fn write_view_template(&mut self, template: IrNodeId) -> CodegenResult<()> {
        let pending = std::mem::take(&mut self.literal);
        self.out
            .write(&format!(
                "item => new {}(async({}) => {{",
                names::HELPER_RESULT,
                names::TEMPLATE_WRITER
            ))
            .newline()
            .indent();
        self.out
            .line(&format!("PushWriter({});", names::TEMPLATE_WRITER));
        self.emit_view_children(template)?;
        self.flush_literal();
        self.out.ensure_line_start();
        self.out.line("PopWriter();");
        self.out.dedent().write("})");
        self.literal = pending;
        Ok(())
    }
}
