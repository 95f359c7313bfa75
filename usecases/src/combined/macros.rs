//! Generates the combined use case types for each arity.
//!
//! A child is described as `field: UseCaseParam => ValueParam, input @ index`.
//! The children list travels between arms as a single token tree so it can be
//! destructured again inside the per-method arms.

macro_rules! combined_use_case {
    (@define
        $(#[$doc:meta])*
        $name:ident
        { $($field:ident: $U:ident => $T:ident, $input:ident @ $idx:tt);+ $(;)? }
        $zip:ident
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<$($U),+> {
            $($field: $U,)+
        }

        impl<$($U),+> $name<$($U),+> {
            /// Joins the given use cases in order.
            #[must_use]
            pub fn new($($field: $U),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl<$($U,)+ $($T,)+ E> $crate::usecase::UseCase for $name<$($U),+>
        where
            $($U: $crate::usecase::UseCase<Output = $crate::observable::Observable<$T, E>>,)+
            $($T: Send + 'static,)+
            E: Send + 'static,
        {
            type Input = ($(<$U as $crate::usecase::UseCase>::Input,)+);
            type Output = $crate::observable::Observable<($($T,)+), E>;

            fn execute(&self, input: Self::Input) -> Self::Output {
                let children = ($($crate::usecase::UseCase::execute(&self.$field, input.$idx),)+);
                $crate::observable::Observable::from_boxed(move || {
                    $crate::observable::zip::$zip($(children.$idx.stream()),+)
                })
            }
        }

        impl<$($U,)+ $($T,)+ E> $name<$($U),+>
        where
            $($U: $crate::usecase::UseCase<Output = $crate::observable::Observable<$T, E>>,)+
            $($T: Send + 'static,)+
            E: Send + 'static,
        {
            /// Executes with one input per child, in order.
            pub fn execute_each(
                &self,
                $($input: <$U as $crate::usecase::UseCase>::Input),+
            ) -> $crate::observable::Observable<($($T,)+), E> {
                $crate::usecase::UseCase::execute(self, ($($input,)+))
            }
        }

        impl<$($U,)+ $($T,)+ E> $name<$($U),+>
        where
            $($U: $crate::usecase::UseCase<Input = (), Output = $crate::observable::Observable<$T, E>>,)+
            $($T: Send + 'static,)+
            E: Send + 'static,
        {
            /// Executes a join whose children all take `()`.
            pub fn run(&self) -> $crate::observable::Observable<($($T,)+), E> {
                $crate::usecase::UseCase::execute(self, ($(combined_use_case!(@unit $U),)+))
            }
        }
    };

    (@omit
        $name:ident
        { $($field:ident: $U:ident => $T:ident, $input:ident @ $idx:tt);+ $(;)? }
        $(#[$doc:meta])*
        $method:ident $Unit:ident ($($arg:ident: $Arg:ident),+) $slots:tt
    ) => {
        impl<$($U,)+ $($T,)+ E> $name<$($U),+>
        where
            $($U: $crate::usecase::UseCase<Output = $crate::observable::Observable<$T, E>>,)+
            $Unit: $crate::usecase::UseCase<Input = ()>,
            $($T: Send + 'static,)+
            E: Send + 'static,
        {
            $(#[$doc])*
            pub fn $method(
                &self,
                $($arg: <$Arg as $crate::usecase::UseCase>::Input),+
            ) -> $crate::observable::Observable<($($T,)+), E> {
                $crate::usecase::UseCase::execute(self, $slots)
            }
        }
    };

    (@unit $U:ident) => {
        ()
    };

    (
        $(#[$doc:meta])*
        pub struct $name:ident $children:tt
        zip = $zip:ident;
        omit {
            $(
                $(#[$omit_doc:meta])*
                $method:ident: $Unit:ident ($($arg:ident: $Arg:ident),+) => $slots:tt;
            )+
        }
    ) => {
        combined_use_case!(@define $(#[$doc])* $name $children $zip);
        $(
            combined_use_case!(@omit $name $children $(#[$omit_doc])* $method $Unit ($($arg: $Arg),+) $slots);
        )+
    };
}
