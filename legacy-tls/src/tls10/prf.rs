use hmac::digest::core_api::BlockSizeUser;
use hmac::digest::Digest;
use hmac::{Mac, SimpleHmac};
use md5::Md5;
use sha1::Sha1;

/// The TLS1.0 PRF: `P_MD5(S1, label + seed) XOR P_SHA1(S2, label + seed)`,
/// where S1 and S2 are the (possibly overlapping) halves of `secret`.
pub(crate) fn prf(out: &mut [u8], secret: &[u8], label: &[u8], seed: &[u8]) {
    let half = (secret.len() + 1) / 2;
    let s1 = &secret[..half];
    let s2 = &secret[secret.len() - half..];

    p_hash::<Md5>(out, s1, label, seed);

    let mut sha1_out = vec![0u8; out.len()];
    p_hash::<Sha1>(&mut sha1_out, s2, label, seed);

    for (o, s) in out.iter_mut().zip(sha1_out.iter()) {
        *o ^= s;
    }
}

fn p_hash<D>(out: &mut [u8], secret: &[u8], label: &[u8], seed: &[u8])
where
    D: Digest + BlockSizeUser + Clone,
{
    let hmac_key = SimpleHmac::<D>::new_from_slice(secret).expect("HMAC can take key of any size");

    // A(1)
    let mut current_a = {
        let mut ctx = hmac_key.clone();
        ctx.update(label);
        ctx.update(seed);
        ctx.finalize().into_bytes()
    };

    let chunk_size = <D as Digest>::output_size();
    for chunk in out.chunks_mut(chunk_size) {
        // P_hash[i] = HMAC_hash(secret, A(i) + label + seed)
        let mut ctx = hmac_key.clone();
        ctx.update(&current_a);
        ctx.update(label);
        ctx.update(seed);
        let p_term = ctx.finalize().into_bytes();
        chunk.copy_from_slice(&p_term[..chunk.len()]);

        // A(i+1) = HMAC_hash(secret, A(i))
        let mut ctx = hmac_key.clone();
        ctx.update(&current_a);
        current_a = ctx.finalize().into_bytes();
    }
}
