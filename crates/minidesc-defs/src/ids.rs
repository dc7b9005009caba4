//! Handles of defs stored in a [`crate::DefPool`].

macro_rules! def_ids {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
            #[repr(transparent)]
            pub struct $name(pub(crate) u32);

            impl $name {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

def_ids! {
    FileId;
    MessageId;
    /// Fields and extensions share one index space.
    FieldId;
    OneofId;
    EnumId;
    EnumValueId;
    ServiceId;
    MethodId;
}
