use policyrag_core::traits::EmbeddingProvider;
use policyrag_embed::HashEmbedder;

#[tokio::test]
async fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(3072);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed(&texts).await.expect("embed");
    assert_eq!(embs.len(), 2, "one vector per input");

    let v1 = &embs[0];
    let v2 = &embs[1];
    assert_eq!(v1.len(), 3072, "embedding dim matches configuration");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!(
        (norm - 1.0).abs() <= 1e-3,
        "vector is L2-normalized (norm={norm})"
    );

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6, "same input, same vector");
    }
}

#[tokio::test]
async fn hash_embedder_separates_unrelated_texts() {
    let embedder = HashEmbedder::new(256);
    let embs = embedder
        .embed(&[
            "access control policy review".to_string(),
            "quarterly fire drill procedure".to_string(),
        ])
        .await
        .expect("embed");

    let dot: f32 = embs[0].iter().zip(embs[1].iter()).map(|(a, b)| a * b).sum();
    let self_dot: f32 = embs[0].iter().map(|a| a * a).sum();
    assert!(
        dot < self_dot * 0.9,
        "disjoint token sets should not be near-identical (dot={dot})"
    );
}

#[tokio::test]
async fn hash_embedder_empty_batch_is_empty() {
    let embedder = HashEmbedder::new(64);
    let embs = embedder.embed(&[]).await.expect("embed");
    assert!(embs.is_empty());
}
