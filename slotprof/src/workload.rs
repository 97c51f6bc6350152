//! Deterministic synthetic workload for the CLI driver.
//!
//! Simulates a small request-serving program. Every step enters and leaves
//! frames on a shared [`CallStack`], burns a little CPU in each function,
//! and reports allocations to a callback with the stack at that moment.
//!
//! ```text
//! main
//! ├── load_config              (every 50th step)
//! └── serve_request
//!     ├── parse_request
//!     ├── handle_request
//!     │   ├── query_db         (1 in 4 steps)
//!     │   └── render_template
//!     └── compress_response
//! ```

use crate::backtrace::{CallStack, Frame, FrameGuard};
use crate::symbolization::SymbolTable;

const FUNCTIONS: [&str; 8] = [
    "main",
    "load_config",
    "serve_request",
    "parse_request",
    "handle_request",
    "query_db",
    "render_template",
    "compress_response",
];

const MAIN: usize = 0;
const LOAD_CONFIG: usize = 1;
const SERVE_REQUEST: usize = 2;
const PARSE_REQUEST: usize = 3;
const HANDLE_REQUEST: usize = 4;
const QUERY_DB: usize = 5;
const RENDER_TEMPLATE: usize = 6;
const COMPRESS_RESPONSE: usize = 7;

const SEED: u64 = 0x2545_f491_4f6c_dd1d;

/// Work units per microsecond-ish; only relative cost matters.
const ITERATIONS_PER_UNIT: u64 = 2_000;

/// Allocation callback: the current stack and the bytes allocated.
pub type AllocationHook<'a> = dyn FnMut(&CallStack, u64) + 'a;

/// Synthetic program driving the profilers.
pub struct Workload {
    stack: CallStack,
    frames: Vec<Frame>,
    state: u64,
    steps: u64,
}

impl Workload {
    /// Create the workload, interning its function names in `symbols`.
    pub fn new(symbols: &mut SymbolTable) -> Self {
        let frames = FUNCTIONS.iter().map(|name| symbols.frame(name)).collect();
        Self { stack: CallStack::new(), frames, state: SEED, steps: 0 }
    }

    /// The stack the workload pushes to; hand a clone to the sampler.
    #[must_use]
    pub fn call_stack(&self) -> &CallStack {
        &self.stack
    }

    /// Steps run so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run one simulated request.
    pub fn step(&mut self, allocate: &mut AllocationHook<'_>) {
        self.steps += 1;
        let _main = self.enter(MAIN);

        if self.steps % 50 == 1 {
            let _config = self.enter(LOAD_CONFIG);
            allocate(&self.stack, 4096);
            burn(20);
        }

        let _serve = self.enter(SERVE_REQUEST);
        {
            let _parse = self.enter(PARSE_REQUEST);
            let size = 256 + self.below(768);
            allocate(&self.stack, size);
            let cost = 10 + self.below(10);
            burn(cost);
        }
        {
            let _handle = self.enter(HANDLE_REQUEST);
            if self.below(4) == 0 {
                let _query = self.enter(QUERY_DB);
                allocate(&self.stack, 1024);
                burn(40);
            }
            let _render = self.enter(RENDER_TEMPLATE);
            allocate(&self.stack, 2048);
            burn(15);
        }
        let _compress = self.enter(COMPRESS_RESPONSE);
        allocate(&self.stack, 512);
        burn(25);
    }

    fn enter(&self, function: usize) -> FrameGuard {
        self.stack.enter(self.frames[function].clone())
    }

    /// xorshift64, reduced to `0..bound`
    fn below(&mut self, bound: u64) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state % bound
    }
}

fn burn(units: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..units * ITERATIONS_PER_UNIT {
        acc = acc.wrapping_mul(31).wrapping_add(i);
    }
    std::hint::black_box(acc)
}
