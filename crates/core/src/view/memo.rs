/// Cached output of a pure computation, recomputed only when the inputs it was
/// computed from differ by value from the inputs it is asked for.
#[derive(Debug)]
pub struct Memo<I, O> {
    cached: Option<(I, O)>,
    computations: u64,
}

impl<I: PartialEq, O> Memo<I, O> {
    pub fn new() -> Self {
        Self {
            cached: None,
            computations: 0,
        }
    }

    pub fn get(&mut self, inputs: I, compute: impl FnOnce(&I) -> O) -> &O {
        if self
            .cached
            .as_ref()
            .is_some_and(|(cached, _)| *cached != inputs)
        {
            self.cached = None;
        }

        let computations = &mut self.computations;
        let (_, output) = self.cached.get_or_insert_with(|| {
            *computations += 1;
            let output = compute(&inputs);
            (inputs, output)
        });
        output
    }

    /// How many times the computation actually ran
    pub fn computations(&self) -> u64 {
        self.computations
    }
}

impl<I: PartialEq, O> Default for Memo<I, O> {
    fn default() -> Self {
        Self::new()
    }
}
