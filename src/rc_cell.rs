/*!
Shared-cell wrappers used for tree nodes.

The parent→child edge of the tree owns its target through [`RcRefCell`]; the
child→parent and attribute→owner back-references are [`WeakRefCell`] so that
no reference cycles exist and dropping a detached subtree frees it.
*/

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct RcRefCell<T: Sized> {
    inner: Rc<RefCell<T>>,
}

#[derive(Debug)]
pub(crate) struct WeakRefCell<T: Sized> {
    inner: Weak<RefCell<T>>,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl<T> Clone for RcRefCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// ------------------------------------------------------------------------------------------------

impl<T> RcRefCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakRefCell<T> {
        WeakRefCell {
            inner: Rc::downgrade(&self.inner),
        }
    }

    ///
    /// Identity, not value, comparison; two handles are equal when they name
    /// the same cell.
    ///
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }
}

// ------------------------------------------------------------------------------------------------

impl<T> Clone for WeakRefCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// ------------------------------------------------------------------------------------------------

impl<T> WeakRefCell<T> {
    pub(crate) fn upgrade(&self) -> Option<RcRefCell<T>> {
        self.inner.upgrade().map(|inner| RcRefCell { inner })
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    pub struct Node {
        pub name: String,
        pub parent: Option<WeakRef>,
    }

    type NodeRef = RcRefCell<Node>;
    type WeakRef = WeakRefCell<Node>;

    impl Node {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                parent: None,
            }
        }
    }

    #[test]
    fn test_ref_aliasing() {
        let ref1: NodeRef = RcRefCell::new(Node::new("name-1"));
        {
            assert_eq!(ref1.borrow().name, "name-1");
            assert!(ref1.borrow().parent.is_none());
        }
        let ref2: NodeRef = ref1.clone();
        {
            let mut mut_inner = ref2.borrow_mut();
            mut_inner.name = "name-2".to_string();
        }
        assert_eq!(ref1.borrow().name, "name-2");
        assert!(ref1.ptr_eq(&ref2));
        assert!(!ref1.ptr_eq(&RcRefCell::new(Node::new("name-2"))));
    }

    #[test]
    fn test_weak_back_reference() {
        let parent: NodeRef = RcRefCell::new(Node::new("parent"));
        let child: NodeRef = RcRefCell::new(Node::new("child"));
        child.borrow_mut().parent = Some(parent.downgrade());

        let upgraded = child.borrow().parent.as_ref().and_then(WeakRefCell::upgrade);
        assert!(upgraded.is_some());
        assert_eq!(upgraded.as_ref().map(|p| p.borrow().name.clone()), Some("parent".to_string()));

        drop(parent);
        drop(upgraded);
        assert!(child.borrow().parent.as_ref().and_then(WeakRefCell::upgrade).is_none());
    }
}
