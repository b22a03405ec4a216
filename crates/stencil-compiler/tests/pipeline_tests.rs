//! End-to-end pipeline tests.
//!
//! Tests verify the full pipeline: source → parse → lower → passes → codegen
//! for components, pages and legacy views, plus configuration, JSON results,
//! determinism and concurrent use of one configuration.

use std::sync::Arc;
use std::thread;

use stencil_codegen::{CompilationPhase, GenerationMode};
use stencil_compiler::{
    check, compile, compile_str, compile_to_result, lower, CodeDocument, CompileResult,
    CompilerConfig, CompilerOptions, ComponentSet, PassContext, PassPipeline, BUILTIN_PASSES,
};
use stencil_types::{
    BoundAttributeDescriptor, ComponentDescriptor, DirectiveRegistry, DocumentShape, ErrorCode,
    FileKind, IrDocument, IrKind, SourceFile,
};

// ══════════════════════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════════════════════

const COUNTER: &str = r#"@page "/counter"
@using System.Text
@inject ILogger<Counter> Logger

<h1>Counter</h1>
<p>Current count: @count</p>
<button @onclick="Increment">Click me</button>

@code {
    private int count = 0;

    private void Increment()
    {
        count++;
    }
}
"#;

const HOME_PAGE: &str = "@page \"/home\"\n<h1>Hello @name</h1>\n@{ var name = \"world\"; }\n";

const LEGACY_VIEW: &str = "<ul>\n@foreach (var item in Model.Items) {\n    <li>@item</li>\n}\n</ul>\n";

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn compile_with(name: &str, text: &str, kind: FileKind, config: &CompilerConfig) -> CodeDocument {
    let source = SourceFile::new(name, text);
    compile(&source, kind, &ComponentSet::empty(), config)
        .unwrap_or_else(|e| panic!("compile failed: {e}"))
}

fn compile_ok(name: &str, text: &str, kind: FileKind) -> CodeDocument {
    let doc = compile_with(name, text, kind, &CompilerConfig::default());
    assert!(
        !doc.has_errors(),
        "{name} should compile cleanly, got: {:?}",
        doc.diagnostics().errors
    );
    doc
}

/// Every mapping points at text that was copied verbatim.
fn assert_mappings_verbatim(doc: &CodeDocument) {
    let generated = doc.generated_code();
    let source = doc.source();
    assert!(doc.source_map().is_monotonic());
    for m in doc.source_map().iter() {
        assert!(m.original.end_offset() <= source.len());
        let original = source.slice(m.original);
        let copied = &generated[m.generated.offset..m.generated.end_offset()];
        assert_eq!(copied, original);
    }
}

fn mapped_texts(doc: &CodeDocument) -> Vec<&str> {
    doc.source_map()
        .iter()
        .map(|m| doc.source().slice(m.original))
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// 1. Output shapes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn component_compiles_to_render_tree_class() {
    let doc = compile_ok("Pages/Counter.stencil", COUNTER, FileKind::Component);
    assert_eq!(doc.shape(), DocumentShape::Component);

    let code = doc.generated_code();
    assert!(code.contains("namespace Stencil.Generated.Pages"));
    assert_eq!(
        doc.class_declaration(),
        Some("public partial class Counter : global::Stencil.Components.ComponentBase")
    );
    assert!(code.contains("protected override void BuildRenderTree("));
    assert!(code.contains("[global::Stencil.Components.RouteAttribute(\"/counter\")]"));
    assert!(code.contains("[global::Stencil.Components.InjectAttribute]"));
    assert!(code.contains("__builder.AddContent("));
    assert!(code.contains("private void Increment()"));
}

#[test]
fn page_compiles_to_execute_async() {
    let doc = compile_ok("Home.stencil", HOME_PAGE, FileKind::Template);
    assert_eq!(doc.shape(), DocumentShape::Page);
    assert_eq!(
        doc.class_declaration(),
        Some("public partial class Home : global::Stencil.Mvc.Page")
    );
    let code = doc.generated_code();
    assert!(code.contains("public async override global::System.Threading.Tasks.Task ExecuteAsync()"));
    assert!(code.contains("WriteLiteral("));
    assert!(code.contains("Write(name);"));
}

#[test]
fn template_without_page_is_legacy_view() {
    let doc = compile_ok("Views/List.stencil", LEGACY_VIEW, FileKind::Template);
    assert_eq!(doc.shape(), DocumentShape::LegacyView);
    assert_eq!(
        doc.class_declaration(),
        Some("public partial class List : global::Stencil.Mvc.RazorPage<dynamic>")
    );
    assert!(mapped_texts(&doc).contains(&"item"));
}

#[test]
fn usings_are_emitted_and_mapped() {
    let doc = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
    assert!(doc.generated_code().contains("using System.Text;"));
    assert!(mapped_texts(&doc).contains(&"System.Text"));
}

#[test]
fn root_namespace_comes_from_options() {
    let options = CompilerOptions {
        root_namespace: "MyApp".into(),
        ..CompilerOptions::default()
    };
    let config = CompilerConfig::from_options(&options).unwrap();
    let doc = compile_with("Shared/Nav-Menu/Item.stencil", "<p>x</p>", FileKind::Component, &config);
    assert!(doc.generated_code().contains("namespace MyApp.Shared.Nav_Menu"));
}

#[test]
fn namespace_directive_wins() {
    let doc = compile_ok(
        "Shared/Item.stencil",
        "@namespace Acme.Widgets\n<p>x</p>",
        FileKind::Component,
    );
    assert!(doc.generated_code().contains("namespace Acme.Widgets"));
    assert!(!doc.generated_code().contains("namespace Stencil.Generated"));
}

// ══════════════════════════════════════════════════════════════════════════════
// 2. Source mappings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn mappings_copy_user_code_verbatim() {
    for (name, text, kind) in [
        ("Counter.stencil", COUNTER, FileKind::Component),
        ("Home.stencil", HOME_PAGE, FileKind::Template),
        ("List.stencil", LEGACY_VIEW, FileKind::Template),
    ] {
        let doc = compile_ok(name, text, kind);
        assert!(!doc.source_map().is_empty(), "{name} should have mappings");
        assert_mappings_verbatim(&doc);
    }
}

#[test]
fn expression_maps_back_to_its_source() {
    let doc = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
    let at = COUNTER.find("@count").unwrap() + 1;
    let generated = doc.source_map().to_generated(at).unwrap();
    assert_eq!(doc.source_map().to_original(generated), Some(at));
    assert_eq!(&doc.generated_code()[generated..generated + "count".len()], "count");
}

#[test]
fn design_time_mappings_are_verbatim_too() {
    let config = CompilerConfig::default().with_mode(GenerationMode::DesignTime);
    let doc = compile_with("Counter.stencil", COUNTER, FileKind::Component, &config);
    assert_eq!(doc.mode(), GenerationMode::DesignTime);
    assert_mappings_verbatim(&doc);
    // Directive tokens are kept alive in the design-time helper.
    let texts = mapped_texts(&doc);
    assert!(texts.contains(&"\"/counter\""));
    assert!(texts.contains(&"ILogger<Counter>"));
}

#[test]
fn code_fragments_are_exact_source_slices() {
    let doc = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
    let ir = doc.ir();
    let fragments = ir.find_all(|k| matches!(k, IrKind::CodeFragment { .. }));
    assert!(!fragments.is_empty());
    for id in fragments {
        let IrKind::CodeFragment { text } = ir.kind(id) else {
            unreachable!()
        };
        let span = ir.span(id).unwrap();
        assert_eq!(text, doc.source().slice(span));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// 3. Checksums
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn checksum_is_stored_and_emitted_in_design_time() {
    let config = CompilerConfig::default().with_mode(GenerationMode::DesignTime);
    let doc = compile_with("Counter.stencil", COUNTER, FileKind::Component, &config);
    assert_eq!(doc.checksum().len(), 64);
    assert!(doc.generated_code().contains(&format!(
        "#pragma checksum \"Counter.stencil\" \"{{8829d00f-11b8-4213-878b-770e8597ac16}}\" \"{}\"",
        doc.checksum()
    )));
}

#[test]
fn optimized_output_has_no_checksum_pragma() {
    let doc = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
    assert_eq!(doc.checksum().len(), 64);
    assert!(!doc.generated_code().contains("#pragma checksum"));
}

// ══════════════════════════════════════════════════════════════════════════════
// 4. Diagnostics never abort
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn malformed_input_still_generates() {
    let doc = compile_with(
        "Broken.stencil",
        "<div>\n@code {\n  int x;\n",
        FileKind::Component,
        &CompilerConfig::default(),
    );
    assert!(doc.has_errors());
    assert!(doc.diagnostics().with_code(ErrorCode::UNCLOSED_BLOCK).len() == 1);
    assert!(doc.class_declaration().is_some());
    assert_eq!(doc.syntax().text(), "<div>\n@code {\n  int x;\n");
}

#[test]
fn unknown_directive_is_reported() {
    let doc = compile_str("@model Foo.Bar\n<p>x</p>", "View.stencil", FileKind::Template).unwrap();
    assert_eq!(doc.diagnostics().with_code(ErrorCode::UNKNOWN_DIRECTIVE).len(), 1);
}

#[test]
fn extra_directive_is_accepted() {
    let options: CompilerOptions = serde_json::from_str(
        r#"{ "extra_directives": [
            { "name": "model", "kind": "single_line", "usage": "single_occurrence",
              "tokens": [ { "kind": "type", "name": "ModelType" } ] }
        ] }"#,
    )
    .unwrap();
    let config = CompilerConfig::from_options(&options).unwrap();
    let doc = compile_with("View.stencil", "@model Foo.Bar\n<p>x</p>", FileKind::Template, &config);
    assert!(doc.diagnostics().is_empty(), "{:?}", doc.diagnostics());
    assert!(doc
        .ir()
        .find_all(|k| matches!(k, IrKind::Directive { name, .. } if name == "model"))
        .len()
        == 1);
}

#[test]
fn check_reports_without_generating() {
    let source = SourceFile::new("Broken.stencil", "<p>@(</p>");
    let diagnostics = check(
        &source,
        FileKind::Template,
        &ComponentSet::empty(),
        &CompilerConfig::default(),
    );
    assert!(diagnostics.has_errors());
}

#[test]
fn empty_pipeline_skips_pass_diagnostics() {
    let options = CompilerOptions {
        passes: Some(vec![]),
        ..CompilerOptions::default()
    };
    let config = CompilerConfig::from_options(&options).unwrap();
    let doc = compile_with("T.stencil", "<div>@<p>x</p></div>", FileKind::Template, &config);
    assert!(doc.diagnostics().with_code(ErrorCode::MISPLACED_TEMPLATE).is_empty());

    let doc = compile_with(
        "T.stencil",
        "<div>@<p>x</p></div>",
        FileKind::Template,
        &CompilerConfig::default(),
    );
    assert_eq!(doc.diagnostics().with_code(ErrorCode::MISPLACED_TEMPLATE).len(), 1);
}

#[test]
fn rerunning_passes_reports_nothing_new() {
    let text = "@inherits\n<p>x</p>\n@typeparam T\n@typeparam T\n\
                <Counter Count=\"1\" Title=\"x\" />\n<Missing />\n\
                <input @bind />\n<div>@<p>y</p></div>\n";
    let source = SourceFile::new("Host.stencil", text);
    let registry = DirectiveRegistry::with_defaults();
    let components = ComponentSet::new(vec![ComponentDescriptor::new("App.Counter")
        .with_attribute(BoundAttributeDescriptor::property("Count", "int"))])
    .unwrap();
    let cx = PassContext {
        source: &source,
        components: &components,
        registry: &registry,
    };
    let fresh_ir = || -> IrDocument {
        let parsed = stencil_parser::parse(&source, FileKind::Component, &registry);
        lower(&parsed.tree, &source, FileKind::Component, &registry)
    };

    let pipeline = PassPipeline::builtin();
    let mut ir = fresh_ir();
    pipeline.run(&mut ir, &cx);
    let first = ir.collect_diagnostics();
    pipeline.run(&mut ir, &cx);
    assert_eq!(ir.collect_diagnostics(), first);

    let codes: Vec<ErrorCode> = first.iter().map(|d| d.code).collect();
    for expected in [
        ErrorCode::DIRECTIVE_TOKEN_MISSING,
        ErrorCode::DUPLICATE_DIRECTIVE,
        ErrorCode::UNKNOWN_ATTRIBUTE,
        ErrorCode::UNBOUND_COMPONENT_TAG,
        ErrorCode::MALFORMED_BIND,
        ErrorCode::MISPLACED_TEMPLATE,
    ] {
        assert_eq!(
            codes.iter().filter(|&&c| c == expected).count(),
            1,
            "{expected:?} in {codes:?}"
        );
    }

    // Each pass on its own is stable too.
    for name in BUILTIN_PASSES {
        let single = PassPipeline::from_names(&[name]).unwrap();
        let mut ir = fresh_ir();
        single.run(&mut ir, &cx);
        let once = ir.collect_diagnostics();
        single.run(&mut ir, &cx);
        assert_eq!(ir.collect_diagnostics(), once, "{name}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// 5. End-to-end: legacy bind attribute
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn legacy_bind_attribute_is_plain_markup() {
    let text = r#"<input type="text" bind="" />"#;
    for kind in [FileKind::Template, FileKind::Component] {
        let doc = compile_with("Form.stencil", text, kind, &CompilerConfig::default());
        let binding: Vec<_> = doc
            .diagnostics()
            .iter()
            .filter(|d| d.category == stencil_types::ErrorCategory::Binding)
            .collect();
        assert!(binding.is_empty(), "{kind:?}: {binding:?}");
        assert!(doc.diagnostics().is_empty());
        assert!(doc.generated_code().contains("bind"));
    }

    let doc = compile_ok("Form.stencil", text, FileKind::Template);
    assert!(doc
        .generated_code()
        .contains(r#"WriteLiteral("<input type=\"text\" bind=\"\" />");"#));
}

// ══════════════════════════════════════════════════════════════════════════════
// 6. JSON results
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn valid_source_produces_success_result() {
    let result = compile_to_result(COUNTER, "Counter.stencil", FileKind::Component);
    assert!(result.success);
    assert!(result.generated.is_some());
    assert!(result.source_map.is_some());
    assert!(!result.errors.has_errors());

    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["success"], true);
    assert!(!parsed["generated"].is_null());
}

#[test]
fn invalid_source_produces_failure_result() {
    let result = compile_to_result("<div>@(x</div>", "Bad.stencil", FileKind::Template);
    assert!(!result.success);
    assert!(result.errors.has_errors());
    // Output is still produced for tooling.
    assert!(result.generated.is_some());

    let json = serde_json::to_string(&result).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["success"], false);
}

#[test]
fn compile_result_json_roundtrip() {
    let result = compile_to_result(COUNTER, "Counter.stencil", FileKind::Component);
    let json = serde_json::to_string(&result).unwrap();
    let rt: CompileResult = serde_json::from_str(&json).unwrap();
    assert_eq!(rt.success, result.success);
    assert_eq!(rt.generated, result.generated);
    assert_eq!(rt.source_map, result.source_map);
    assert_eq!(rt.checksum, result.checksum);
}

// ══════════════════════════════════════════════════════════════════════════════
// 7. Determinism and concurrency
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn compilation_is_deterministic() {
    let reference = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
    for i in 0..100 {
        let doc = compile_ok("Counter.stencil", COUNTER, FileKind::Component);
        assert_eq!(
            doc.generated_code(),
            reference.generated_code(),
            "iteration {i} produced different output"
        );
        assert_eq!(doc.source_map(), reference.source_map());
        assert_eq!(doc.checksum(), reference.checksum());
    }
}

#[test]
fn one_config_serves_parallel_compilations() {
    let config = Arc::new(CompilerConfig::default());
    let components = ComponentSet::empty();
    let reference = compile_ok("Counter.stencil", COUNTER, FileKind::Component);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = Arc::clone(&config);
            let components = components.clone();
            thread::spawn(move || {
                let source = SourceFile::new("Counter.stencil", COUNTER);
                (0..25)
                    .map(|_| {
                        compile(&source, FileKind::Component, &components, &config)
                            .map(|doc| doc.generated_code().to_string())
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for output in handle.join().unwrap() {
            assert_eq!(output.unwrap(), reference.generated_code());
        }
    }
}

#[test]
fn documents_move_across_threads() {
    fn assert_send<T: Send + Sync>() {}
    assert_send::<CodeDocument>();
    assert_send::<CompilerConfig>();
    assert_send::<ComponentSet>();
}

#[test]
fn phase_is_recorded() {
    let config = CompilerConfig::default().with_phase(CompilationPhase::DeclarationOnly);
    let doc = compile_with("Counter.stencil", COUNTER, FileKind::Component, &config);
    assert_eq!(doc.phase(), CompilationPhase::DeclarationOnly);
    assert!(!doc.generated_code().contains("BuildRenderTree"));
}
