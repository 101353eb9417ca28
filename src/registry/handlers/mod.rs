pub mod material;
pub mod object;
pub mod primitive;
pub mod script;
pub mod workspace;

use crate::error::SceneError;
use crate::scene::{ObjectHandle, ObjectRef};
use crate::state::AppContext;

/// Resolve an optional object name, defaulting to the active object.
pub(crate) fn target_object(
    ctx: &AppContext,
    name: Option<String>,
) -> Result<ObjectHandle, SceneError> {
    ctx.scene.get_object(&ObjectRef::from_name(name))
}
