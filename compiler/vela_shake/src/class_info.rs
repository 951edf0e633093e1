//! Compiled class descriptors fed into the dependency graph.
//!
//! The class-file reader produces one [`ClassInfo`] per compiled class,
//! listing its methods and every inter-class and inter-method dependency it
//! observed, each tagged weak or strong. The graph consumes these through
//! [`DependencyGraph::add`](crate::DependencyGraph::add) and never inspects
//! class files itself.
//!
//! Class internal names are slash-separated (`java/lang/String`); method
//! descriptors are JVM-style signature strings (`(I)Ljava/lang/String;`).

/// Metadata and dependency lists for one compiled class.
#[derive(Clone, Debug, Default)]
pub struct ClassInfo {
    /// The class was compiled from an enum declaration.
    pub is_enum: bool,
    /// The class is a native-interop struct.
    pub is_struct: bool,
    /// Class-level dependencies: superclass, interfaces, field types,
    /// annotations and the like.
    pub dependencies: Vec<Dependency>,
    /// The class's declared methods.
    pub methods: Vec<MethodInfo>,
}

/// Metadata and dependency list for one declared method.
#[derive(Clone, Debug, Default)]
pub struct MethodInfo {
    /// Method name (`<init>` and `<clinit>` for the special methods).
    pub name: String,
    /// JVM-style method descriptor.
    pub desc: String,
    pub is_static: bool,
    /// Invoked from outside the managed call graph (e.g. by native code);
    /// must survive tree-shaking regardless of observed invocations.
    pub is_callback: bool,
    /// Eligible for dropping when only weakly referenced.
    pub is_weakly_linked: bool,
    /// Mandatory whenever referenced, even under the aggressive policy.
    pub is_strongly_linked: bool,
    /// Dependencies recorded in the method body.
    pub dependencies: Vec<Dependency>,
}

/// One dependency recorded by the class-file reader.
///
/// Weak dependencies are followed during reachability traversal only when
/// the target's link attributes and the active
/// [`TreeShakerMode`](crate::TreeShakerMode) permit; strong dependencies are
/// always followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dependency {
    /// Plain class-to-class dependency.
    Class { name: String, weak: bool },
    /// An invocation of the method `owner.name desc`.
    Invoke {
        owner: String,
        name: String,
        desc: String,
        weak: bool,
    },
    /// The recording method overrides `owner.name desc`. At method level
    /// this pins the override whenever the super method is reached.
    Super {
        owner: String,
        name: String,
        desc: String,
        weak: bool,
    },
}
