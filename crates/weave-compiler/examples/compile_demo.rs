//! Compile a nested workflow specification and print the resulting GraphIR.
//!
//! Run with `RUST_LOG=weave_compiler=trace` to watch the lowering pass.

use weave_compiler::{compile_with_provenance, CompileOptions};
use weave_spec::{
    Block, ChoiceBlock, ChoiceCase, CompositeBlock, JoinMode, LoopBlock, ParallelBlock,
    ParallelBranch, SequenceBlock, SpecError, TaskReference,
};

fn task(task_id: &str) -> Result<Block, SpecError> {
    Ok(TaskReference::new(task_id)?.into())
}

fn build_spec() -> Result<Block, SpecError> {
    Ok(SequenceBlock::new(vec![
        task("ingest")?,
        ParallelBlock::new(
            vec![
                ParallelBranch::new("train", task("train")?)?,
                ParallelBranch::new("eval", task("eval")?)?,
            ],
            JoinMode::And,
        )?
        .into(),
        ChoiceBlock::new(
            vec![ChoiceCase::new(
                "publish",
                Some("is_good".to_string()),
                task("publish")?,
            )?],
            Some(LoopBlock::new(task("tune")?, "not_good", Some(3))?.into()),
        )?
        .into(),
        CompositeBlock::new(
            "packaging",
            SequenceBlock::new(vec![task("bundle")?, task("upload")?])?,
        )?
        .into(),
    ])?
    .into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let spec = build_spec()?;
    let (graph, composites) =
        compile_with_provenance(&spec, &CompileOptions::new("training-pipeline"))?;

    println!("{}", serde_json::to_string_pretty(&graph)?);
    for ((entry, exit), name) in &composites {
        eprintln!("composite '{name}' spans {entry} .. {exit}");
    }
    Ok(())
}
