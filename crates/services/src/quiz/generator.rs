use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use catapult_core::model::{
    Cat, OPTION_COUNT, PhotoUrl, PromptKind, Question, QuestionError, QuizMode,
};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, warn};

use crate::catalog_service::PhotoSource;
use crate::error::GenerateError;

const DISTRACTORS: usize = OPTION_COUNT - 1;

/// Produces one question per call from the session's cat pool.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerateError::DataUnavailable` once the draw budget is spent.
    async fn generate(&self, pool: &[Cat], rng: &mut StdRng) -> Result<Question, GenerateError>;
}

/// Why a single draw could not become a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rejection {
    NoPhotos,
    TooFewTraits { found: usize },
    TooFewOtherCats { found: usize },
    TooFewForeignTraits { found: usize },
    Malformed(QuestionError),
}

/// Draw-and-retry generator driven by the prompt kinds of one quiz mode.
pub struct CatQuestionGenerator {
    kinds: &'static [PromptKind],
    photos: Arc<dyn PhotoSource>,
    max_attempts: u32,
}

impl CatQuestionGenerator {
    #[must_use]
    pub fn new(kinds: &'static [PromptKind], photos: Arc<dyn PhotoSource>, max_attempts: u32) -> Self {
        Self {
            kinds,
            photos,
            max_attempts: max_attempts.max(1),
        }
    }
}

/// The question strategy used by `mode`.
#[must_use]
pub fn generator_for_mode(
    mode: QuizMode,
    photos: Arc<dyn PhotoSource>,
    max_attempts: u32,
) -> Arc<dyn QuestionGenerator> {
    Arc::new(CatQuestionGenerator::new(mode.prompt_kinds(), photos, max_attempts))
}

#[async_trait]
impl QuestionGenerator for CatQuestionGenerator {
    async fn generate(&self, pool: &[Cat], rng: &mut StdRng) -> Result<Question, GenerateError> {
        if pool.is_empty() || self.kinds.is_empty() {
            return Err(GenerateError::EmptyPool);
        }

        for attempt in 1..=self.max_attempts {
            let mut order: Vec<&Cat> = pool.iter().collect();
            order.shuffle(rng);
            let chosen = order[0];
            let Some(&kind) = self.kinds.choose(rng) else {
                return Err(GenerateError::EmptyPool);
            };

            if kind.needs_traits() {
                let found = chosen.traits().len();
                if found < DISTRACTORS {
                    let reason = Rejection::TooFewTraits { found };
                    debug!(attempt, cat_id = %chosen.id(), ?kind, ?reason, "draw rejected");
                    continue;
                }
            }

            let photos = self.photos.resolve_photos(chosen).await?;
            let Some(image) = photos.choose(rng).cloned() else {
                debug!(attempt, cat_id = %chosen.id(), reason = ?Rejection::NoPhotos, "draw rejected");
                continue;
            };

            match build_question(kind, chosen, pool, Some(image), rng) {
                Ok(question) => return Ok(question),
                Err(reason) => {
                    debug!(attempt, cat_id = %chosen.id(), ?kind, ?reason, "draw rejected");
                }
            }
        }

        warn!(attempts = self.max_attempts, "question generation exhausted its attempts");
        Err(GenerateError::DataUnavailable {
            attempts: self.max_attempts,
        })
    }
}

/// Builds the four options for `chosen`, or says why it cannot.
pub(crate) fn build_question<R: Rng + ?Sized>(
    kind: PromptKind,
    chosen: &Cat,
    pool: &[Cat],
    image: Option<PhotoUrl>,
    rng: &mut R,
) -> Result<Question, Rejection> {
    let (correct, mut options) = match kind {
        PromptKind::IdentifyByPhoto => {
            let names = other_names(chosen, pool);
            if names.len() < DISTRACTORS {
                return Err(Rejection::TooFewOtherCats { found: names.len() });
            }
            (chosen.name().to_owned(), pick(names, DISTRACTORS, rng))
        }
        PromptKind::OddTraitOut => {
            let own = own_traits(chosen)?;
            let foreign = foreign_traits(chosen, pool);
            let Some(correct) = foreign.choose(rng).cloned() else {
                return Err(Rejection::TooFewForeignTraits { found: 0 });
            };
            (correct, pick(own, DISTRACTORS, rng))
        }
        PromptKind::PickMatchingTrait => {
            let own = own_traits(chosen)?;
            let foreign = foreign_traits(chosen, pool);
            if foreign.len() < DISTRACTORS {
                return Err(Rejection::TooFewForeignTraits {
                    found: foreign.len(),
                });
            }
            let Some(correct) = own.choose(rng).cloned() else {
                return Err(Rejection::TooFewTraits { found: 0 });
            };
            (correct, pick(foreign, DISTRACTORS, rng))
        }
    };

    options.push(correct.clone());
    options.shuffle(rng);
    Question::new(kind, options, correct, image).map_err(Rejection::Malformed)
}

fn own_traits(chosen: &Cat) -> Result<Vec<String>, Rejection> {
    let traits = chosen.traits();
    if traits.len() < DISTRACTORS {
        return Err(Rejection::TooFewTraits {
            found: traits.len(),
        });
    }
    Ok(traits)
}

/// Normalized traits of every other cat, minus the chosen cat's own.
fn foreign_traits(chosen: &Cat, pool: &[Cat]) -> Vec<String> {
    let own: BTreeSet<String> = chosen.traits().into_iter().collect();
    let foreign: BTreeSet<String> = pool
        .iter()
        .filter(|cat| cat.id() != chosen.id())
        .flat_map(Cat::traits)
        .filter(|t| !own.contains(t))
        .collect();
    foreign.into_iter().collect()
}

fn other_names(chosen: &Cat, pool: &[Cat]) -> Vec<String> {
    let names: BTreeSet<&str> = pool
        .iter()
        .filter(|cat| cat.id() != chosen.id() && cat.name() != chosen.name())
        .map(Cat::name)
        .collect();
    names.into_iter().map(str::to_owned).collect()
}

fn pick<R: Rng + ?Sized>(mut items: Vec<String>, n: usize, rng: &mut R) -> Vec<String> {
    items.shuffle(rng);
    items.truncate(n);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::model::CatId;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::repository::StorageError;

    struct FixedPhotos(HashMap<String, Vec<PhotoUrl>>);

    #[async_trait]
    impl PhotoSource for FixedPhotos {
        async fn resolve_photos(&self, cat: &Cat) -> Result<Vec<PhotoUrl>, StorageError> {
            Ok(self.0.get(cat.id().as_str()).cloned().unwrap_or_default())
        }
    }

    fn cat(id: &str, name: &str, temperament: &str) -> Cat {
        Cat::new(CatId::new(id).unwrap(), name, "", "", temperament).unwrap()
    }

    fn pool() -> Vec<Cat> {
        vec![
            cat("abys", "Abyssinian", "Active, Energetic, Independent"),
            cat("beng", "Bengal", "Alert, Agile, Energetic"),
            cat("bsho", "British Shorthair", "Calm, Loyal, Patient"),
            cat("pers", "Persian", "Quiet, Sedate, Affectionate"),
            cat("siam", "Siamese", "Clever, Sociable, Vocal"),
        ]
    }

    fn photos_for_all(pool: &[Cat]) -> Arc<dyn PhotoSource> {
        let map = pool
            .iter()
            .map(|c| {
                let url = PhotoUrl::parse(format!("https://cdn.example.com/{}.jpg", c.id())).unwrap();
                (c.id().as_str().to_owned(), vec![url])
            })
            .collect();
        Arc::new(FixedPhotos(map))
    }

    fn assert_integrity(q: &Question) {
        assert_eq!(q.options().len(), OPTION_COUNT);
        let distinct: BTreeSet<&String> = q.options().iter().collect();
        assert_eq!(distinct.len(), OPTION_COUNT);
        assert_eq!(
            q.options().iter().filter(|o| o.as_str() == q.correct_answer()).count(),
            1
        );
    }

    #[test]
    fn every_kind_builds_valid_options() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            for kind in PromptKind::ALL {
                for chosen in &pool {
                    let q = build_question(kind, chosen, &pool, None, &mut rng).unwrap();
                    assert_integrity(&q);
                    assert_eq!(q.kind(), kind);
                }
            }
        }
    }

    #[test]
    fn trait_kinds_use_correct_sides() {
        let pool = pool();
        let chosen = &pool[2];
        let own = chosen.traits();
        let mut rng = StdRng::seed_from_u64(3);

        let odd = build_question(PromptKind::OddTraitOut, chosen, &pool, None, &mut rng).unwrap();
        assert!(!own.contains(&odd.correct_answer().to_owned()));
        assert!(odd.options().iter().filter(|o| own.contains(*o)).count() == DISTRACTORS);

        let matching =
            build_question(PromptKind::PickMatchingTrait, chosen, &pool, None, &mut rng).unwrap();
        assert!(own.contains(&matching.correct_answer().to_owned()));
        assert!(matching.options().iter().filter(|o| own.contains(*o)).count() == 1);
    }

    #[test]
    fn identify_needs_three_other_names() {
        let pool = vec![
            cat("a", "Alpha", "x, y, z"),
            cat("b", "Beta", "x, y, z"),
            cat("c", "Beta", "x, y, z"),
            cat("d", "Gamma", "x, y, z"),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_question(PromptKind::IdentifyByPhoto, &pool[0], &pool, None, &mut rng)
            .unwrap_err();
        assert_eq!(err, Rejection::TooFewOtherCats { found: 2 });
    }

    #[test]
    fn duplicate_traits_do_not_count_twice() {
        let thin = cat("thin", "Thin", "Calm, calm , CALM, Loyal");
        let pool = vec![thin.clone(), cat("x", "X", "Active, Alert, Agile")];
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_question(PromptKind::OddTraitOut, &thin, &pool, None, &mut rng).unwrap_err();
        assert_eq!(err, Rejection::TooFewTraits { found: 2 });
    }

    #[tokio::test]
    async fn generator_attaches_photo() {
        let pool = pool();
        let generator =
            CatQuestionGenerator::new(QuizMode::GuessCat.prompt_kinds(), photos_for_all(&pool), 10);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let q = generator.generate(&pool, &mut rng).await.unwrap();
            assert_eq!(q.kind(), PromptKind::IdentifyByPhoto);
            assert!(q.image().unwrap().starts_with("https://cdn.example.com/"));
            assert_integrity(&q);
        }
    }

    #[tokio::test]
    async fn odd_trait_out_without_traits_is_unavailable() {
        let pool: Vec<Cat> = (0..5)
            .map(|i| cat(&format!("c{i}"), &format!("Cat {i}"), "Calm, Loyal"))
            .collect();
        let generator =
            CatQuestionGenerator::new(&[PromptKind::OddTraitOut], photos_for_all(&pool), 10);
        let mut rng = StdRng::seed_from_u64(5);
        let err = generator.generate(&pool, &mut rng).await.unwrap_err();
        assert!(matches!(err, GenerateError::DataUnavailable { attempts: 10 }));
    }

    struct CountingPhotos(AtomicUsize);

    #[async_trait]
    impl PhotoSource for CountingPhotos {
        async fn resolve_photos(&self, cat: &Cat) -> Result<Vec<PhotoUrl>, StorageError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PhotoUrl::parse(format!("https://cdn.example.com/{}.jpg", cat.id())).unwrap()])
        }
    }

    #[tokio::test]
    async fn trait_poor_cats_skip_photo_lookup() {
        let pool: Vec<Cat> = (0..5)
            .map(|i| cat(&format!("c{i}"), &format!("Cat {i}"), "Calm, Loyal"))
            .collect();
        let photos = Arc::new(CountingPhotos(AtomicUsize::new(0)));
        let generator = CatQuestionGenerator::new(
            &[PromptKind::PickMatchingTrait],
            Arc::clone(&photos) as Arc<dyn PhotoSource>,
            6,
        );
        let mut rng = StdRng::seed_from_u64(9);
        let err = generator.generate(&pool, &mut rng).await.unwrap_err();
        assert!(matches!(err, GenerateError::DataUnavailable { attempts: 6 }));
        assert_eq!(photos.0.load(Ordering::SeqCst), 0);

        let identify = CatQuestionGenerator::new(
            &[PromptKind::IdentifyByPhoto],
            Arc::clone(&photos) as Arc<dyn PhotoSource>,
            6,
        );
        let q = identify.generate(&pool, &mut rng).await.unwrap();
        assert_eq!(q.kind(), PromptKind::IdentifyByPhoto);
        assert_eq!(photos.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_photos_exhaust_budget() {
        let pool = pool();
        let generator = CatQuestionGenerator::new(
            QuizMode::GuessFact.prompt_kinds(),
            Arc::new(FixedPhotos(HashMap::new())),
            4,
        );
        let mut rng = StdRng::seed_from_u64(5);
        let err = generator.generate(&pool, &mut rng).await.unwrap_err();
        assert!(matches!(err, GenerateError::DataUnavailable { attempts: 4 }));
    }

    #[tokio::test]
    async fn empty_pool_is_reported() {
        let generator = CatQuestionGenerator::new(&PromptKind::ALL, photos_for_all(&[]), 3);
        let mut rng = StdRng::seed_from_u64(5);
        let err = generator.generate(&[], &mut rng).await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyPool));
    }
}
