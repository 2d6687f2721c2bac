use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueHint};

use lc3vm::instruction::Instruction;
use lc3vm::loader::read_image_file;
use lc3vm::memory::Memory;

#[derive(Parser)]
#[clap(version, about = "Disassembles an LC-3 program image")]
struct Opt {
    /// Program image to disassemble
    #[clap(value_hint = ValueHint::FilePath)]
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let mut memory = Memory::new();
    let image = read_image_file(&opt.image, &mut memory)
        .with_context(|| format!("failed to load image {}", opt.image.display()))?;

    for addr in (0..image.words).map(|i| image.origin.wrapping_add(i as u16)) {
        let word = memory.peek(addr);
        println!("{addr:#06x}: {word:#06x} ({})", Instruction::decode(word));
    }

    Ok(())
}
