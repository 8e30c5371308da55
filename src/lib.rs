pub mod core;
pub mod schema;
pub mod codec;
pub mod storage;
pub mod cache;
pub mod sort;
pub mod search;

/*
┌──────────────────────────────────────────────────────────────────────────────────────┐
│                              PANINDEX STRUCT ARCHITECTURE                            │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── CORE LAYER ──────────────────────────────────────┐
│                                                                                      │
│  ┌──────────────────────────────────────────────────────────────────────────────┐    │
│  │                            struct PanIndexer                                 │    │
│  │  config: Config                          // Index dirs, sort backend, limits │    │
│  │  collections: HashMap<String, CollectionIndex>                               │    │
│  │  counters: Arc<IndexCounters>            // Cache hits/builds                │    │
│  └──────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                      │
│  ┌──────────────────────────────────────────────────────────────────────────────┐    │
│  │                          struct CollectionIndex                              │    │
│  │  cache: TableCache          ──► ensure(ref)           -> Fingerprint         │    │
│  │  sorter: SortCoordinator    ──► sorted_view(fp, sort) -> LineSource          │    │
│  │  filter: QueryFilter        ──► run(source, query, start, limit, num_found)  │    │
│  └──────────────────────────────────────────────────────────────────────────────┘    │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────── CACHE LAYER ──────────────────────────────────────┐
│                                                                                      │
│  trait ObjectStore              struct TableCache                                    │
│  • resolve_version(ref)         • layout: CacheLayout                                │
│  • fetch_projected(ref, paths)  • schema: CollectionSchema                           │
│                                 • store: Arc<dyn ObjectStore>                        │
│  MemoryObjectStore                                                                   │
│  JsonDirObjectStore             miss: fetch ─► RecordCodec::encode ─► TableWriter    │
│                                       (gzip temp file ─► fsync ─► rename)            │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────── SORT LAYER ───────────────────────────────────────┐
│                                                                                      │
│  SortPlan { keys: Vec<ResolvedKey> }      code() = "<col><a|d>..."                   │
│                                                                                      │
│  trait ExternalSort                                                                  │
│  ├── UnixSort    LC_ALL=C sort -s -t<TAB> -k<c>,<c>[f|n][r]   (feeder thread)        │
│  └── MergeSort   rayon-sorted runs ─► lz4 spill ─► k-way merge                       │
│                                                                                      │
│  SortCoordinator: base <= max_sort_mem_size ─► stream                                │
│                   otherwise                 ─► persist, then open                    │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────── STORAGE LAYER ─────────────────────────────────────┐
│                                                                                      │
│  <dir>/<fp><suffix>.tsv.gz                  base table                               │
│  <dir>/<fp>_<suffix>_<code>.tsv.gz          sorted table                             │
│                                                                                      │
│  enum LineSource { File(gzip), Process(sort stdout), Memory(Vec<String>) }           │
│  Drop closes the file or kills + reaps the child                                     │
└──────────────────────────────────────────────────────────────────────────────────────┘
*/
