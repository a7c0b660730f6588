//! Directive expansion against notebooks on disk

use notebook_mdx_directive::{
    process_document, DirectiveError, DirectiveOptions, DirectiveProcessor, EmitMode,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOTEBOOK: &str = r##"{
  "metadata": {"kernelspec": {"language": "python"}},
  "cells": [
    {"cell_type": "markdown", "source": "# Results"},
    {"cell_type": "code", "source": "print(1)", "execution_count": 1,
     "outputs": [{"output_type": "stream", "name": "stdout", "text": "1\n"}]}
  ]
}"##;

const CHART_NOTEBOOK: &str = r#"{"cells": [{"cell_type": "code", "source": "fig", "outputs": [
    {"output_type": "display_data", "metadata": {},
     "data": {"application/vnd.plotly.v1+json": {"data": [{"y": [1, 2]}], "layout": {}}}}
]}]}"#;

fn docs_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("notebooks")).unwrap();
    fs::write(dir.path().join("notebooks/demo.ipynb"), NOTEBOOK).unwrap();
    dir
}

#[test]
fn test_leaf_directive_becomes_component() {
    let dir = docs_dir();
    let doc = dir.path().join("guide.mdx");
    let source = "# Guide\n\n::notebook{file=\"notebooks/demo.ipynb\" hideCode title=\"Demo\"}\n\nThe end.\n";

    let processed = process_document(source, Some(&doc), &DirectiveOptions::default()).unwrap();

    assert!(processed.content.starts_with("# Guide\n\n<NotebookLoader notebookDataJson={\""));
    assert!(processed.content.contains("hideCode={true}"), "{}", processed.content);
    assert!(processed.content.contains("title={\"Demo\"}"));
    assert!(!processed.content.contains("file="), "file is not passed as a prop");
    assert!(processed.content.ends_with(" />\n\nThe end.\n"));
    assert_eq!(processed.notebooks, 1);
    assert_eq!(
        processed.dependencies,
        vec![dir.path().join("notebooks").join("demo.ipynb")]
    );
}

#[test]
fn test_notebook_json_prop_is_the_file_content() {
    let dir = docs_dir();
    let options = DirectiveOptions::default().with_base_dir(dir.path());
    let processed =
        process_document("::notebook{file=notebooks/demo.ipynb}\n", None, &options).unwrap();

    let start = processed.content.find("notebookDataJson={").unwrap() + "notebookDataJson={".len();
    let end = processed.content.rfind("} />").unwrap();
    let literal: String = serde_json::from_str(&processed.content[start..end]).unwrap();
    let prop: serde_json::Value = serde_json::from_str(&literal).unwrap();
    let file: serde_json::Value = serde_json::from_str(NOTEBOOK).unwrap();
    assert_eq!(prop, file);
}

#[test]
fn test_container_caption_and_custom_component() {
    let dir = docs_dir();
    let options = DirectiveOptions::default()
        .with_base_dir(dir.path())
        .with_component_name("JupyterNotebook");
    let source = ":::notebook{file=notebooks/demo.ipynb interactive=false}\nFigure *one*.\n:::\n";

    let processed = process_document(source, None, &options).unwrap();

    assert!(processed.content.starts_with("<JupyterNotebook "));
    assert!(processed.content.contains("interactive={false}"));
    assert!(processed.content.contains("caption={\"Figure *one*.\"}"), "{}", processed.content);
}

#[test]
fn test_dependencies_are_deduplicated() {
    let dir = docs_dir();
    fs::write(dir.path().join("other.ipynb"), r#"{"cells": []}"#).unwrap();
    let options = DirectiveOptions::default().with_base_dir(dir.path());
    let source = "::notebook{file=notebooks/demo.ipynb}\n::notebook{file=other.ipynb}\n::notebook{file=./notebooks/../notebooks/demo.ipynb}\n";

    let processed = process_document(source, None, &options).unwrap();

    assert_eq!(processed.notebooks, 3);
    assert_eq!(
        processed.dependencies,
        vec![
            dir.path().join("notebooks").join("demo.ipynb"),
            dir.path().join("other.ipynb"),
        ]
    );
}

#[test]
fn test_missing_notebook_fails_with_path() {
    let dir = docs_dir();
    let options = DirectiveOptions::default().with_base_dir(dir.path());
    let err = process_document("::notebook{file=nope.ipynb}\n", None, &options).unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, DirectiveError::Load { .. }));
    assert!(message.starts_with("Failed to process notebook file \""), "{message}");
    assert!(message.contains("nope.ipynb"), "{message}");
}

#[test]
fn test_invalid_json_fails() {
    let dir = docs_dir();
    fs::write(dir.path().join("broken.ipynb"), "{ not json").unwrap();
    let options = DirectiveOptions::default().with_base_dir(dir.path());
    let err = process_document("::notebook{file=broken.ipynb}\n", None, &options).unwrap_err();
    assert!(err.to_string().contains("Failed to parse notebook JSON"), "{err}");
}

#[test]
fn test_missing_file_attribute_fails() {
    let err = process_document("::notebook{hideCode}\n", None, &DirectiveOptions::default())
        .unwrap_err();
    assert!(matches!(err, DirectiveError::MissingFile { line: 1 }));
}

#[test]
fn test_text_directive_fails() {
    let err = process_document(
        "Inline :notebook{file=x.ipynb} here\n",
        None,
        &DirectiveOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DirectiveError::TextDirective { line: 1 }));
}

#[test]
fn test_html_mode_embeds_rendered_markup_and_styles_once() {
    let dir = docs_dir();
    let options = DirectiveOptions::default()
        .with_base_dir(dir.path())
        .with_emit(EmitMode::Html);
    let source = "::notebook{file=notebooks/demo.ipynb #first}\n\n::notebook{file=notebooks/demo.ipynb hideCode}\n";

    let processed = process_document(source, None, &options).unwrap();

    assert_eq!(processed.content.matches("<style id=\"jupyter-notebook-styles\"").count(), 1);
    assert_eq!(processed.content.matches("<div className={\"notebook-mdx\"}").count(), 2);
    assert!(processed.content.contains("id={\"first\"}"));
    assert!(processed.content.contains("<h1>Results</h1>"));
    assert_eq!(
        processed.content.matches("In [1]:").count(),
        1,
        "second notebook hides code"
    );
}

#[test]
fn test_process_file_uses_document_directory() {
    let dir = docs_dir();
    let doc = dir.path().join("page.mdx");
    fs::write(&doc, "::notebook{file=\"notebooks/demo.ipynb\"}\n").unwrap();

    let processed = DirectiveProcessor::default().process_file(&doc).unwrap();
    assert_eq!(processed.notebooks, 1);
    assert!(processed.dependencies[0].ends_with(Path::new("notebooks/demo.ipynb")));
}

#[test]
fn test_html_mode_charts_use_static_view() {
    let dir = docs_dir();
    fs::write(dir.path().join("chart.ipynb"), CHART_NOTEBOOK).unwrap();
    let options = DirectiveOptions::default()
        .with_base_dir(dir.path())
        .with_emit(EmitMode::Html)
        .with_styles(false);
    let source = "::notebook{file=chart.ipynb}\n\n::notebook{file=chart.ipynb interactive}\n";

    let processed = process_document(source, None, &options).unwrap();

    assert!(!processed.content.contains("<script"), "{}", processed.content);
    assert!(!processed.content.contains("Loading chart..."));
    assert_eq!(processed.content.matches("jp-chart-static").count(), 2);
}

#[test]
fn test_html_mode_class_is_escaped() {
    let dir = docs_dir();
    let options = DirectiveOptions::default()
        .with_base_dir(dir.path())
        .with_emit(EmitMode::Html)
        .with_styles(false);
    let source = "::notebook{file=notebooks/demo.ipynb class='wide\" onClick=\"x'}\n";

    let processed = process_document(source, None, &options).unwrap();

    assert!(
        processed
            .content
            .starts_with(r#"<div className={"notebook-mdx wide\" onClick=\"x"} dangerouslySetInnerHTML="#),
        "{}",
        processed.content
    );
}

#[test]
fn test_html_mode_caption_figure_class_is_escaped() {
    let dir = docs_dir();
    let options = DirectiveOptions::default()
        .with_base_dir(dir.path())
        .with_emit(EmitMode::Html)
        .with_styles(false);
    let source = ":::notebook{file=notebooks/demo.ipynb .wide}\nResults.\n:::\n";

    let processed = process_document(source, None, &options).unwrap();

    assert!(
        processed.content.starts_with("<figure className={\"notebook-mdx wide\"}>\n"),
        "{}",
        processed.content
    );
    assert!(processed.content.contains("<figcaption dangerouslySetInnerHTML="));
}
