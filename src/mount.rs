//! Binding a [`Node`] tree to a container element.

use crate::{
	diff::{ChildReconciliation, Positional, Reconciler},
	dom::Dom,
	error::{DomError, MountError},
	node::Node,
};
use tracing::{debug, instrument};

/// Where to mount.
#[derive(Debug, Clone, PartialEq)]
pub enum Container<N> {
	Node(N),
	/// Looked up with [`Dom::get_element_by_id`].
	Id(String),
}
impl<N> From<&str> for Container<N> {
	fn from(id: &str) -> Self {
		Container::Id(id.to_owned())
	}
}
impl<N> From<String> for Container<N> {
	fn from(id: String) -> Self {
		Container::Id(id)
	}
}

/// Renders `root` into `container` after clearing it.
///
/// # Errors
///
/// [`MountError::ContainerNotFound`] iff `container` names an ID that doesn't exist,
/// [`MountError::Dom`] iff a host DOM call fails.
pub fn mount<D: Dom>(dom: D, root: Node, container: impl Into<Container<D::Node>>) -> Result<Mounted<D>, MountError> {
	Mounted::new(Reconciler::new(dom), root, container.into())
}

/// [`mount`] with a configured [`Reconciler`].
///
/// # Errors
///
/// See [`mount`].
pub fn mount_with<D: Dom, S: ChildReconciliation>(reconciler: Reconciler<D, S>, root: Node, container: impl Into<Container<D::Node>>) -> Result<Mounted<D, S>, MountError> {
	Mounted::new(reconciler, root, container.into())
}

/// A mounted tree. Owns the relation between the current root [`Node`] and the live DOM in its container.
#[derive(Debug)]
pub struct Mounted<D: Dom, S = Positional> {
	reconciler: Reconciler<D, S>,
	container: D::Node,
	root: Option<Node>,
	live: Option<D::Node>,
}
impl<D: Dom, S: ChildReconciliation> Mounted<D, S> {
	#[instrument(skip(reconciler, root))]
	fn new(reconciler: Reconciler<D, S>, root: Node, container: Container<D::Node>) -> Result<Self, MountError> {
		let container = match container {
			Container::Node(node) => node,
			Container::Id(id) => reconciler.dom().get_element_by_id(&id).ok_or(MountError::ContainerNotFound(id))?,
		};
		reconciler.dom().clear_children(&container)?;
		let live = reconciler.render(&root, &container)?;
		debug!("Mounted.");
		Ok(Self {
			reconciler,
			container,
			root: Some(root),
			live,
		})
	}

	/// Reconciles the live DOM to `new_root`.
	///
	/// If nothing is currently rendered, the container is cleared and `new_root` is rendered from scratch.
	/// `new_root` becomes the retained root even if this fails.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	#[instrument(skip(self, new_root))]
	pub fn update(&mut self, new_root: Node) -> Result<(), DomError> {
		let result = match &self.live {
			Some(live) => self.reconciler.patch(&new_root, self.root.as_ref(), live),
			None => self.reconciler.dom().clear_children(&self.container).and_then(|()| self.reconciler.render(&new_root, &self.container)),
		};
		self.root = Some(new_root);
		self.live = result?;
		Ok(())
	}

	/// Clears the container and forgets the retained root.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	#[instrument(skip(self))]
	pub fn unmount(&mut self) -> Result<(), DomError> {
		if let (Some(root), Some(live)) = (self.root.take(), self.live.take()) {
			self.reconciler.unbind(&root, &live, self.reconciler.depth_limit())?
		}
		self.reconciler.dom().clear_children(&self.container)?;
		debug!("Unmounted.");
		Ok(())
	}

	#[must_use]
	pub fn root(&self) -> Option<&Node> {
		self.root.as_ref()
	}

	/// The live node rendered for [`Mounted::root`].
	#[must_use]
	pub fn live(&self) -> Option<&D::Node> {
		self.live.as_ref()
	}

	#[must_use]
	pub fn container(&self) -> &D::Node {
		&self.container
	}

	#[must_use]
	pub fn reconciler(&self) -> &Reconciler<D, S> {
		&self.reconciler
	}
}
