#![warn(missing_docs)]
//! Module for additional uom macros that facilitate the creation of Points or single unit values
/// helper macro to create the units
#[macro_export]
macro_rules! uom_unit_creator {

    ($unit:ident, $unit_type:ident, $val1:expr) => {
        $unit_type::new::<$unit>($val1)
    };
    ($unit:ident, $unit_type:ident, $val1:expr, $val2:expr, $val3:expr) => {
        {
        use nalgebra::Point3;
        Point3::new(
            $unit_type::new::<$unit>($val1),
            $unit_type::new::<$unit>($val2),
            $unit_type::new::<$unit>($val3))
        }
    };
}

///macro to create a Length in meter
#[macro_export]
macro_rules! meter {
    ($( $x:expr ),*) =>{
        {
            use uom::si::{f64::Length, length::meter};
            $crate::uom_unit_creator![meter, Length, $( $x ),*]
        }
    };
}
///macro to create a Length in millimeter
#[macro_export]
macro_rules! millimeter {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Length, length::millimeter};
        $crate::uom_unit_creator![millimeter, Length, $( $x ),*]
    }};
}
///macro to create a Time in second
#[macro_export]
macro_rules! second {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Time, time::second};
        $crate::uom_unit_creator![second, Time, $( $x ),*]
    }};
}
///macro to create a Time in millisecond
#[macro_export]
macro_rules! millisecond {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Time, time::millisecond};
        $crate::uom_unit_creator![millisecond, Time, $( $x ),*]
    }};
}
///macro to create an angle in degree
#[macro_export]
macro_rules! degree {
    ($( $x:expr ),*) =>{{
        use uom::si::{f64::Angle, angle::degree};
        $crate::uom_unit_creator![degree, Angle, $( $x ),*]
    }};
}
