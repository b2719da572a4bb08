/// Declare a model's closed set of watch keys with their wire names.
macro_rules! watch_keys {
    (
        $(#[$meta:meta])*
        pub enum $name:ident for $model:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )*
        }
        requires_data: [$($data_key:ident),*]
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl mirra_state::WatchKey for $name {
            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)*
                }
            }

            fn requires_data(self) -> bool {
                false $(|| self == $name::$data_key)*
            }
        }

        impl std::str::FromStr for $name {
            type Err = mirra_core::MirraError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                use mirra_state::WatchKey;
                Self::ALL
                    .iter()
                    .copied()
                    .find(|key| key.name() == s)
                    .ok_or_else(|| mirra_core::MirraError::InvalidWatchKey {
                        model: $model,
                        key: s.to_owned(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                use mirra_state::WatchKey;
                f.write_str(self.name())
            }
        }
    };
}

/// Route dispatcher callbacks into the model's `Watchable` implementation.
macro_rules! batch_listener {
    ($model:ty) => {
        impl mirra_state::BatchListener for $model {
            fn label(&self) -> &str {
                $crate::watchable::Watchable::core(self).label()
            }

            fn before_batch(&self, data: &mirra_state::BaseData) {
                $crate::watchable::Watchable::observe_before_batch(self, data);
            }

            fn handle_batch(
                &self,
                batch: &mirra_state::BatchContext<'_>,
            ) -> mirra_state::ListenerReport {
                $crate::watchable::Watchable::dispatch_batch(self, batch)
            }
        }
    };
}

/// Let a model be passed wherever "handle or raw id" is accepted.
macro_rules! entity_handle {
    ($model:ty, $id:ty) => {
        impl $crate::entity::HasId for $model {
            fn id_str(&self) -> &str {
                self.id().as_str()
            }
        }

        impl<'a> From<&'a $model> for $crate::entity::EntityRef<'a, $model> {
            fn from(handle: &'a $model) -> Self {
                $crate::entity::EntityRef::Handle(handle)
            }
        }

        impl<'a> From<&'a std::sync::Arc<$model>> for $crate::entity::EntityRef<'a, $model> {
            fn from(handle: &'a std::sync::Arc<$model>) -> Self {
                $crate::entity::EntityRef::Handle(handle.as_ref())
            }
        }

        impl<'a> From<&'a $id> for $crate::entity::EntityRef<'a, $model> {
            fn from(id: &'a $id) -> Self {
                $crate::entity::EntityRef::Id(id.as_str())
            }
        }
    };
}
