/// Utterances the interactive loop steps through on `next`, covering one
/// command from every category.
pub const DEMO_UTTERANCES: &[&str] = &[
    "add a cube",
    "make it red",
    "rotate it ninety degrees around the x axis",
    "scale it up to twice its size",
    "move it two units to the right",
    "add a subdivision surface modifier",
    "add a sphere",
    "color the cube blue",
    "add an emission shader node",
    "switch to edit mode",
    "open the shader editor",
    "show me the top view",
    "switch back to object mode",
    "delete the selected object",
];

/// Cycles through [`DEMO_UTTERANCES`], wrapping at the end.
#[derive(Debug, Default)]
pub struct DemoScript {
    position: usize,
}

impl DemoScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_utterance(&mut self) -> &'static str {
        let utterance = DEMO_UTTERANCES
            .get(self.position % DEMO_UTTERANCES.len())
            .copied()
            .unwrap_or_default();
        self.position += 1;
        utterance
    }
}
