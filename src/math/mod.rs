// Réexporte toutes les structures et fonctions mathématiques

mod math;

pub use math::{
    generate_safe_prime, is_probable_prime, mod_inverse, random_in_range, reduce_signed,
    SafePrime, MIN_KEY_BITS,
};
