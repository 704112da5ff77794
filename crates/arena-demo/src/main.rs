use std::{
    alloc::{GlobalAlloc as _, Layout},
    process, slice,
};

use arena::{Allocation, Arena, LockedArena};
use argh::FromArgs;
use snafu::{OptionExt as _, Report, ResultExt as _, Whatever, ensure_whatever};

const DEFAULT_SIZES: [usize; 2] = [128, 256];

/// Allocate blocks from a byte arena and print its free ranges.
#[derive(Debug, FromArgs)]
struct Args {
    /// arena capacity in bytes
    #[argh(option, default = "1024")]
    capacity: usize,
    /// free the blocks in reverse allocation order
    #[argh(switch)]
    reverse: bool,
    /// also allocate a `[u32; 16]` through the `GlobalAlloc` adapter
    #[argh(switch)]
    adapter: bool,
    /// block sizes to allocate (default: 128 256)
    #[argh(positional)]
    sizes: Vec<usize>,
}

fn main() {
    env_logger::init();
    let args: Args = argh::from_env();

    if let Err(err) = run(&args) {
        let report = Report::from_error(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Whatever> {
    let sizes = if args.sizes.is_empty() {
        &DEFAULT_SIZES[..]
    } else {
        &args.sizes[..]
    };

    let mut arena = Arena::new(args.capacity)
        .with_whatever_context(|_| format!("failed to create arena, capacity={}", args.capacity))?;
    log::info!("created arena, capacity={}", arena.capacity());

    println!("Initial state:");
    print!("{}", arena.dump());

    let mut blocks = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let block = arena.allocate(size).with_whatever_context(|| {
            format!(
                "failed to allocate {size} bytes, largest free range is {} bytes",
                arena.largest_free()
            )
        })?;
        println!("block{}: offset={} size={}", blocks.len(), block.offset(), block.size());
        blocks.push(block);
    }

    if let Some((first, rest)) = blocks.split_first() {
        fill_words(&mut arena, first);
        let bytes = arena.bytes(first);
        println!(
            "block0 as u32: [0]={} [5]={}",
            display_word(bytes, 0),
            display_word(bytes, 5)
        );
        for (i, block) in rest.iter().enumerate() {
            let bytes = arena.bytes_mut(block);
            let len = bytes.len().min(10);
            bytes[..len].fill(42);
            println!("block{}: [0]={}", i + 1, bytes[0]);
        }
    }

    if args.reverse {
        blocks.reverse();
    }
    for block in blocks {
        let offset = block.offset();
        arena
            .deallocate(block)
            .with_whatever_context(|_| format!("failed to free block, offset={offset}"))?;
    }

    println!("Last state:");
    print!("{}", arena.dump());
    arena
        .check_consistency()
        .whatever_context("free-range bookkeeping is inconsistent")?;

    if args.adapter {
        run_adapter(args.capacity)?;
    }

    Ok(())
}

/// Writes `0, 1, 2, ...` into the block as native-endian `u32`s.
fn fill_words(arena: &mut Arena, block: &Allocation) {
    for (chunk, value) in arena.bytes_mut(block).chunks_exact_mut(4).zip(0_u32..) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
}

fn display_word(bytes: &[u8], index: usize) -> String {
    bytes
        .chunks_exact(4)
        .nth(index)
        .and_then(|chunk| chunk.try_into().ok())
        .map_or_else(|| "-".to_owned(), |word| u32::from_ne_bytes(word).to_string())
}

fn run_adapter(capacity: usize) -> Result<(), Whatever> {
    const LEN: usize = 16;

    let heap = LockedArena::new(capacity).whatever_context("failed to create locked arena")?;
    let layout = Layout::array::<u32>(LEN).whatever_context("invalid layout")?;

    let ptr = unsafe { heap.alloc(layout) };
    ensure_whatever!(!ptr.is_null(), "adapter refused {layout:?}");

    #[expect(clippy::cast_ptr_alignment)]
    let words = ptr.cast::<u32>();
    let words = unsafe { slice::from_raw_parts_mut(words, LEN) };
    for (word, n) in words.iter_mut().zip(0_u32..) {
        *word = n * n;
    }
    println!("adapter: [3]={} [15]={}", words[3], words[15]);

    println!("Adapter state:");
    heap.with(|arena| print!("{}", arena.dump()));
    unsafe { heap.dealloc(ptr, layout) };
    println!("Adapter last state:");
    heap.with(|arena| print!("{}", arena.dump()));

    Ok(())
}
