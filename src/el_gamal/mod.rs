pub mod eg_keygen;
pub mod eg_encrypt;
pub mod eg_decrypt;

// Réexportations pratiques pour l'utilisateur du module

pub use eg_keygen::{key_gen, Keys, PublicParameters, SecretShare};
pub use eg_encrypt::{encrypt, Ciphertext};
pub use eg_decrypt::{
    combine_shares, compute_delta, compute_share, decrypt_with_secret, finish_decryption,
    lagrange_coefficients, partial_decrypt, reconstruct_secret, threshold_decrypt,
    DecryptionShare,
};
